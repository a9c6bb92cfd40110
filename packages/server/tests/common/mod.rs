// Common test utilities

pub mod fixtures;
pub mod harness;

#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use harness::*;
