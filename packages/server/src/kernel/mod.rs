//! Kernel module - server infrastructure and dependencies.

pub mod ai;
pub mod deps;
pub mod postgres_store;
pub mod test_dependencies;
pub mod traits;

pub use ai::OpenAIChat;
pub use deps::ServerDeps;
pub use postgres_store::{PostgresSearchStore, PostgresUsageStore};
pub use test_dependencies::TestDependencies;
pub use traits::*;
