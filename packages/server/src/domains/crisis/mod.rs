// Crisis domain - flags queries that need a hotline, not a directory listing
pub mod activities;
pub mod models;

pub use activities::{detect_crisis, CrisisAlert, CrisisResource};
pub use models::CrisisKeyword;
