pub mod detect;

pub use detect::{build_alert, crisis_resources, detect_crisis, match_crisis, CrisisAlert, CrisisResource};
