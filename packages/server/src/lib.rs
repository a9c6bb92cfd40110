// Linksy search service - core library
//
// Natural-language search over a directory of community service providers:
// semantic need matching, proximity ring search, service-area filtering,
// distance ranking and a conversational summary.
//
// Domain logic lives in domains/*; infrastructure traits and their
// implementations live in kernel/.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
