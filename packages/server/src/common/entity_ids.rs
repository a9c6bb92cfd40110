//! Typed ids for the entities the search service reads and writes.

pub use super::id::Id;

/// Marker for taxonomy needs ("Housing Assistance", "Food Pantry", ...).
pub struct NeedEntity;

/// Marker for provider organizations (hosts are providers too).
pub struct ProviderEntity;

/// Marker for provider locations.
pub struct LocationEntity;

/// Marker for search sessions.
pub struct SearchSessionEntity;

pub type NeedId = Id<NeedEntity>;
pub type ProviderId = Id<ProviderEntity>;
pub type LocationId = Id<LocationEntity>;
pub type SearchSessionId = Id<SearchSessionEntity>;
