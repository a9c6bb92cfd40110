use std::cmp::Ordering;

use serde::Serialize;

use crate::common::utils::{haversine_miles, round_to_tenth};
use crate::common::Coordinates;
use crate::domains::locations::Location;
use crate::domains::needs::Need;
use crate::domains::providers::{Provider, ProviderWithRelations};

/// Providers returned to the caller and fed to the summarizer.
pub const MAX_RESULTS: usize = 5;

/// A provider as returned from search, with distance from the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedProvider {
    #[serde(flatten)]
    pub provider: Provider,
    pub locations: Vec<Location>,
    pub needs: Vec<Need>,
    pub primary_location: Option<Location>,
    /// Miles, one decimal place
    pub distance: Option<f64>,
}

/// First location flagged primary, else the first location.
pub fn primary_location(locations: &[Location]) -> Option<&Location> {
    locations
        .iter()
        .find(|l| l.is_primary)
        .or_else(|| locations.first())
}

pub fn distance_from(origin: Option<Coordinates>, location: Option<&Location>) -> Option<f64> {
    let from = origin?;
    let to = location?.coordinates()?;
    Some(round_to_tenth(haversine_miles(from, to)))
}

pub fn attach_distances(
    providers: Vec<ProviderWithRelations>,
    origin: Option<Coordinates>,
) -> Vec<RankedProvider> {
    providers
        .into_iter()
        .map(|entry| {
            let primary = primary_location(&entry.locations).cloned();
            RankedProvider {
                distance: distance_from(origin, primary.as_ref()),
                primary_location: primary,
                provider: entry.provider,
                locations: entry.locations,
                needs: entry.needs,
            }
        })
        .collect()
}

/// Known distances first, ascending. Unknowns keep their relative order.
fn compare_distance(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable ascending sort by distance, nulls last.
pub fn sort_by_distance(providers: &mut [RankedProvider]) {
    providers.sort_by(|a, b| compare_distance(a.distance, b.distance));
}

/// Attaches distances and sorts when the caller's location is known.
///
/// Without a location the retrieval order is kept.
pub fn rank_providers(
    providers: Vec<ProviderWithRelations>,
    origin: Option<Coordinates>,
) -> Vec<RankedProvider> {
    let mut ranked = attach_distances(providers, origin);
    if origin.is_some() {
        sort_by_distance(&mut ranked);
    }
    ranked
}
