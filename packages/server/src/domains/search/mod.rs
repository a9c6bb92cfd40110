//! Search domain - natural-language provider search for hosts and the public site

pub mod activities;
pub mod errors;
pub mod models;
pub mod rate_limit;
pub mod types;

pub use activities::*;
pub use errors::SearchError;
pub use models::{NewSearchSession, SearchSession};
pub use rate_limit::{RateDecision, SlidingWindowLimiter};
pub use types::{FilteredResponse, SearchOutcome, SearchRequest, SearchResponse};
