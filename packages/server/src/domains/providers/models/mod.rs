pub mod host;
pub mod provider;

pub use host::HostProfile;
pub use provider::{Provider, ProviderWithRelations};
