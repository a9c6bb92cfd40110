//! Providers domain - service provider directory and host settings

pub mod models;

pub use models::{HostProfile, Provider, ProviderWithRelations};
