pub mod accounting;
pub mod gate;
pub mod location;
pub mod matching;
pub mod pipeline;
pub mod ranking;
pub mod ring_search;
pub mod service_area;
pub mod summarize;

pub use accounting::{record_search, spawn_best_effort, BackgroundTasks, UsageRecord};
pub use gate::{authorize_host, check_excluded_terms, find_excluded_term, EXCLUDED_QUERY_MESSAGE};
pub use location::{geocode_zip, resolve_location};
pub use matching::{match_needs, normalize_matches, QueryMatch, MAX_NEED_MATCHES, NEED_SIMILARITY_THRESHOLD};
pub use pipeline::{no_match_message, run_search, SearchRun, PROVIDER_FETCH_LIMIT};
pub use ranking::{
    attach_distances, primary_location, rank_providers, sort_by_distance, RankedProvider, MAX_RESULTS,
};
pub use ring_search::{
    miles_to_meters, ring_search, RingSearch, RingSearchOutcome, RingStep, METERS_PER_MILE,
    MIN_NEARBY_PROVIDERS, RING_RADII_MILES,
};
pub use service_area::{partition_by_service_area, serves_zip, ZipExclusion};
pub use summarize::{no_providers_message, summarize, template_message, SummaryContext};
