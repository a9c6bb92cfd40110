pub mod need;

pub use need::*;
