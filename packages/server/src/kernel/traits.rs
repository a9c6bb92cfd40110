// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Business logic (like "rank providers") lives in domain activities that use these traits.
//
// Naming convention: Base* for trait names (e.g., BaseAI, BaseEmbeddingService)

use anyhow::Result;
use async_trait::async_trait;

use crate::common::{Coordinates, NeedId, ProviderId, SearchSessionId};
use crate::domains::crisis::CrisisKeyword;
use crate::domains::needs::NeedMatch;
use crate::domains::providers::{HostProfile, ProviderWithRelations};
use crate::domains::search::NewSearchSession;

// =============================================================================
// AI Trait (Infrastructure - chat completion)
// =============================================================================

/// A single-turn chat prompt
#[derive(Debug, Clone, PartialEq)]
pub struct ChatPrompt {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[async_trait]
pub trait BaseAI: Send + Sync {
    /// Complete a prompt with an LLM (returns raw text response, possibly empty)
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String>;
}

// =============================================================================
// Embedding Service Trait (Infrastructure)
// =============================================================================

/// An embedding vector plus the tokens the provider billed for it
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub vector: Vec<f32>,
    pub total_tokens: i64,
}

#[async_trait]
pub trait BaseEmbeddingService: Send + Sync {
    /// Generate embedding for text (1536-dimensional for the default model)
    async fn generate(&self, text: &str) -> Result<Embedding>;

    /// Model recorded alongside usage
    fn model_name(&self) -> &str;
}

// =============================================================================
// Geocoder Trait (Infrastructure)
// =============================================================================

#[async_trait]
pub trait BaseGeocoder: Send + Sync {
    /// `Ok(None)` when the postal code is unknown to this source.
    async fn geocode_postal_code(&self, postal_code: &str) -> Result<Option<Coordinates>>;
}

// =============================================================================
// Search Store Trait (Infrastructure - read side of a search)
// =============================================================================

#[async_trait]
pub trait BaseSearchStore: Send + Sync {
    async fn find_host(&self, id: ProviderId) -> Result<Option<HostProfile>>;

    /// Lowercased excluded search terms for a host
    async fn host_excluded_terms(&self, id: ProviderId) -> Result<Vec<String>>;

    /// Needs with similarity >= `threshold`, best first
    async fn match_needs(
        &self,
        embedding: &[f32],
        threshold: f64,
        limit: i64,
    ) -> Result<Vec<NeedMatch>>;

    /// Active providers with a location within `radius_meters` of `center`
    async fn provider_ids_within(
        &self,
        center: Coordinates,
        radius_meters: f64,
    ) -> Result<Vec<ProviderId>>;

    /// Active providers offering any of `need_ids`, with relations loaded
    async fn find_providers_for_needs(
        &self,
        need_ids: &[NeedId],
        within: Option<&[ProviderId]>,
        limit: i64,
    ) -> Result<Vec<ProviderWithRelations>>;

    async fn active_crisis_keywords(&self) -> Result<Vec<CrisisKeyword>>;
}

// =============================================================================
// Usage Store Trait (Infrastructure - counters)
// =============================================================================

/// Write side of search telemetry.
///
/// Counters are exposed as increments only; there is no get-then-set path.
#[async_trait]
pub trait BaseUsageStore: Send + Sync {
    async fn create_session(&self, session: &NewSearchSession) -> Result<SearchSessionId>;

    /// `message_count += 1`, `total_tokens_used += tokens`
    async fn increment_session_usage(&self, id: SearchSessionId, tokens: i64) -> Result<()>;

    /// `host_tokens_used_this_month += tokens`
    async fn increment_host_usage(&self, id: ProviderId, tokens: i64) -> Result<()>;
}
