//! Server dependencies for the search pipeline (using traits for testability)
//!
//! This module provides the central dependency container used by domain activities.
//! All external services use trait abstractions to enable testing.

use std::sync::Arc;
use std::time::Duration;

use openai_client::OpenAIClient;
use sqlx::PgPool;

use crate::common::utils::{ChainedGeocoder, EmbeddingService, NominatimGeocoder};
use crate::config::{Config, SearchSettings};
use crate::domains::locations::ZipCodeTableGeocoder;
use crate::domains::search::SlidingWindowLimiter;
use crate::kernel::{
    BaseAI, BaseEmbeddingService, BaseGeocoder, BaseSearchStore, BaseUsageStore, OpenAIChat,
    PostgresSearchStore, PostgresUsageStore,
};

/// Server dependencies accessible to activities (using traits for testability)
#[derive(Clone)]
pub struct ServerDeps {
    pub store: Arc<dyn BaseSearchStore>,
    pub usage: Arc<dyn BaseUsageStore>,
    pub embedding_service: Arc<dyn BaseEmbeddingService>,
    pub ai: Arc<dyn BaseAI>,
    pub geocoder: Arc<dyn BaseGeocoder>,
    /// Shared across requests; keyed by host and caller IP
    pub rate_limiter: Arc<SlidingWindowLimiter>,
    pub settings: SearchSettings,
}

impl ServerDeps {
    /// Create new ServerDeps with the given dependencies
    pub fn new(
        store: Arc<dyn BaseSearchStore>,
        usage: Arc<dyn BaseUsageStore>,
        embedding_service: Arc<dyn BaseEmbeddingService>,
        ai: Arc<dyn BaseAI>,
        geocoder: Arc<dyn BaseGeocoder>,
        settings: SearchSettings,
    ) -> Self {
        Self {
            store,
            usage,
            embedding_service,
            ai,
            geocoder,
            rate_limiter: Arc::new(SlidingWindowLimiter::per_minute()),
            settings,
        }
    }

    /// Wire production implementations from configuration.
    pub fn from_config(config: &Config, pool: PgPool) -> Self {
        // Client-level timeouts back up the per-call ones in the pipeline.
        let openai = OpenAIClient::new(&config.openai_api_key)
            .with_timeout(config.embedding_timeout.max(config.chat_timeout) + Duration::from_secs(5));

        let geocoder = ChainedGeocoder::new(vec![
            Arc::new(ZipCodeTableGeocoder::new(pool.clone())) as Arc<dyn BaseGeocoder>,
            Arc::new(NominatimGeocoder::new(
                &config.geocoder_base_url,
                &config.geocoder_user_agent,
                config.geocoder_timeout,
            )),
        ]);

        Self::new(
            Arc::new(PostgresSearchStore::new(pool.clone())),
            Arc::new(PostgresUsageStore::new(pool)),
            Arc::new(EmbeddingService::new(openai.clone(), &config.embedding_model)),
            Arc::new(OpenAIChat::new(openai, &config.chat_model)),
            Arc::new(geocoder),
            config.search_settings(),
        )
    }

    pub fn with_rate_limiter(mut self, rate_limiter: Arc<SlidingWindowLimiter>) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }
}
