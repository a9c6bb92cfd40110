// Locations domain - provider sites and ZIP reference data
pub mod models;

pub use models::*;
