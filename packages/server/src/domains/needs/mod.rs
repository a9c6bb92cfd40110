// Needs domain - the service taxonomy queries are matched against
pub mod models;

pub use models::*;
