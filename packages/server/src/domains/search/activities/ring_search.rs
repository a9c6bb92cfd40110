//! Widen-until-enough proximity search.
//!
//! Rings are queried smallest first. The first ring holding at least
//! [`MIN_NEARBY_PROVIDERS`] ids wins. Otherwise the first non-empty ring is
//! kept as a fallback, so a single nearby provider is not thrown away in
//! favor of an unconstrained search.

use tracing::{debug, instrument, warn};

use crate::common::{Coordinates, ProviderId};
use crate::kernel::BaseSearchStore;

/// Search radii in miles, smallest first.
pub const RING_RADII_MILES: [u32; 3] = [10, 25, 50];

pub const METERS_PER_MILE: f64 = 1609.34;

/// A ring with at least this many providers ends the search.
pub const MIN_NEARBY_PROVIDERS: usize = 2;

pub fn miles_to_meters(miles: u32) -> f64 {
    f64::from(miles) * METERS_PER_MILE
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingStep {
    Continue,
    Done,
}

/// Result of a ring search.
///
/// `radius_miles` is `None` when every ring came back empty (or no ring was
/// searched); `nearby_ids` is then empty and no proximity constraint applies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RingSearchOutcome {
    pub nearby_ids: Vec<ProviderId>,
    pub radius_miles: Option<u32>,
}

impl RingSearchOutcome {
    /// Ids to constrain the provider fetch to, if any were found.
    pub fn constraint(&self) -> Option<&[ProviderId]> {
        if self.nearby_ids.is_empty() {
            None
        } else {
            Some(&self.nearby_ids)
        }
    }
}

/// State carried between rings
#[derive(Debug, Default)]
pub struct RingSearch {
    best_so_far: Vec<ProviderId>,
    best_radius: Option<u32>,
}

impl RingSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one ring's ids, in increasing radius order.
    pub fn observe(&mut self, radius_miles: u32, ids: Vec<ProviderId>) -> RingStep {
        if ids.len() >= MIN_NEARBY_PROVIDERS {
            self.best_so_far = ids;
            self.best_radius = Some(radius_miles);
            return RingStep::Done;
        }

        if self.best_so_far.is_empty() && !ids.is_empty() {
            self.best_so_far = ids;
            self.best_radius = Some(radius_miles);
        }

        RingStep::Continue
    }

    pub fn finish(self) -> RingSearchOutcome {
        RingSearchOutcome {
            nearby_ids: self.best_so_far,
            radius_miles: self.best_radius,
        }
    }
}

/// Runs the ring search around `center`.
///
/// A failed ring query is logged and counted as an empty ring.
#[instrument(skip(store))]
pub async fn ring_search(center: Coordinates, store: &dyn BaseSearchStore) -> RingSearchOutcome {
    let mut search = RingSearch::new();

    for miles in RING_RADII_MILES {
        let ids = match store.provider_ids_within(center, miles_to_meters(miles)).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, miles, "Nearby provider query failed, treating ring as empty");
                Vec::new()
            }
        };

        debug!(miles, found = ids.len(), "Searched ring");
        if search.observe(miles, ids) == RingStep::Done {
            break;
        }
    }

    search.finish()
}
