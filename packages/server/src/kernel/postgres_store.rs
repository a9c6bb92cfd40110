// Postgres implementations of the search and usage stores.
//
// Thin adapters: every query lives on a domain model; this file only routes
// trait calls to them.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;

use super::{BaseSearchStore, BaseUsageStore};
use crate::common::{Coordinates, NeedId, ProviderId, SearchSessionId};
use crate::domains::crisis::CrisisKeyword;
use crate::domains::needs::{Need, NeedMatch};
use crate::domains::providers::{HostProfile, Provider, ProviderWithRelations};
use crate::domains::search::{NewSearchSession, SearchSession};

#[derive(Clone)]
pub struct PostgresSearchStore {
    pool: PgPool,
}

impl PostgresSearchStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseSearchStore for PostgresSearchStore {
    async fn find_host(&self, id: ProviderId) -> Result<Option<HostProfile>> {
        HostProfile::find_by_id(id, &self.pool)
            .await
            .context("Failed to load host provider")
    }

    async fn host_excluded_terms(&self, id: ProviderId) -> Result<Vec<String>> {
        HostProfile::excluded_terms(id, &self.pool)
            .await
            .context("Failed to load host excluded terms")
    }

    async fn match_needs(
        &self,
        embedding: &[f32],
        threshold: f64,
        limit: i64,
    ) -> Result<Vec<NeedMatch>> {
        Need::match_by_embedding(embedding, threshold, limit, &self.pool)
            .await
            .context("Need similarity search failed")
    }

    async fn provider_ids_within(
        &self,
        center: Coordinates,
        radius_meters: f64,
    ) -> Result<Vec<ProviderId>> {
        Provider::ids_within_radius(center.lat, center.lng, radius_meters, &self.pool)
            .await
            .context("Nearby provider query failed")
    }

    async fn find_providers_for_needs(
        &self,
        need_ids: &[NeedId],
        within: Option<&[ProviderId]>,
        limit: i64,
    ) -> Result<Vec<ProviderWithRelations>> {
        let providers = Provider::find_active_offering_needs(need_ids, within, limit, &self.pool)
            .await
            .context("Failed to fetch providers")?;

        ProviderWithRelations::load(providers, &self.pool)
            .await
            .context("Failed to load provider relations")
    }

    async fn active_crisis_keywords(&self) -> Result<Vec<CrisisKeyword>> {
        CrisisKeyword::find_active(&self.pool)
            .await
            .context("Failed to load crisis keywords")
    }
}

#[derive(Clone)]
pub struct PostgresUsageStore {
    pool: PgPool,
}

impl PostgresUsageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseUsageStore for PostgresUsageStore {
    async fn create_session(&self, session: &NewSearchSession) -> Result<SearchSessionId> {
        SearchSession::create(session, &self.pool)
            .await
            .context("Failed to create search session")
    }

    async fn increment_session_usage(&self, id: SearchSessionId, tokens: i64) -> Result<()> {
        SearchSession::increment_usage(id, tokens, &self.pool)
            .await
            .context("Failed to increment session usage")
    }

    async fn increment_host_usage(&self, id: ProviderId, tokens: i64) -> Result<()> {
        HostProfile::increment_token_usage(id, tokens, &self.pool)
            .await
            .context("Failed to increment host usage")
    }
}
