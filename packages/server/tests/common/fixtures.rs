//! Builders for in-memory search data and database rows.

#![allow(dead_code)]

use anyhow::Result;
use linksy_core::common::{Coordinates, LocationId, NeedId, ProviderId};
use linksy_core::domains::locations::Location;
use linksy_core::domains::needs::{Need, NeedMatch};
use linksy_core::domains::providers::{HostProfile, Provider, ProviderWithRelations};
use pgvector::Vector;
use sqlx::PgPool;

pub fn need(name: &str) -> Need {
    Need {
        id: NeedId::new(),
        name: name.to_string(),
        category: None,
        synonyms: None,
    }
}

pub fn need_match(need: &Need, similarity: f64) -> NeedMatch {
    NeedMatch {
        id: need.id,
        name: need.name.clone(),
        category: need.category.clone(),
        synonyms: need.synonyms.clone(),
        similarity,
    }
}

pub fn provider(name: &str) -> Provider {
    Provider {
        id: ProviderId::new(),
        name: name.to_string(),
        description: None,
        phone: Some("904-555-0100".to_string()),
        email: None,
        website: None,
        sector: Some("nonprofit".to_string()),
        referral_type: None,
        is_active: true,
        provider_status: "active".to_string(),
        llm_context_card: None,
        service_zip_codes: None,
    }
}

pub fn location_at(provider_id: ProviderId, at: Coordinates, is_primary: bool) -> Location {
    Location {
        id: LocationId::new(),
        provider_id,
        name: Some("Main office".to_string()),
        address_line_1: Some("1 Main St".to_string()),
        city: Some("Jacksonville".to_string()),
        state: Some("FL".to_string()),
        postal_code: Some("32073".to_string()),
        latitude: Some(at.lat),
        longitude: Some(at.lng),
        is_primary,
    }
}

/// Active provider offering `needs`, without locations.
pub fn offering(provider: Provider, needs: &[&Need]) -> ProviderWithRelations {
    ProviderWithRelations {
        provider,
        locations: Vec::new(),
        needs: needs.iter().map(|n| (*n).clone()).collect(),
    }
}

/// Active provider offering `needs` from a single primary site.
pub fn offering_at(provider: Provider, needs: &[&Need], at: Coordinates) -> ProviderWithRelations {
    let location = location_at(provider.id, at, true);
    ProviderWithRelations {
        locations: vec![location],
        ..offering(provider, needs)
    }
}

/// Host with embedded search enabled, no budget and no custom rate limit.
pub fn host(name: &str) -> HostProfile {
    HostProfile {
        id: ProviderId::new(),
        name: name.to_string(),
        is_active: true,
        is_host: true,
        host_embed_active: true,
        host_monthly_token_budget: None,
        host_tokens_used_this_month: 0,
        host_search_rate_limit_per_minute: None,
    }
}

/// Unit vector along `axis`, so cosine similarity between fixtures is 0 or 1.
pub fn axis_embedding(axis: usize) -> Vec<f32> {
    let mut vector = vec![0.0; 1536];
    vector[axis] = 1.0;
    vector
}

// =============================================================================
// Database rows
// =============================================================================

pub async fn insert_provider(pool: &PgPool, provider: &Provider) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO providers (
            id, name, description, phone, email, website, sector, referral_type,
            is_active, provider_status, llm_context_card, service_zip_codes
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(provider.id)
    .bind(&provider.name)
    .bind(&provider.description)
    .bind(&provider.phone)
    .bind(&provider.email)
    .bind(&provider.website)
    .bind(&provider.sector)
    .bind(&provider.referral_type)
    .bind(provider.is_active)
    .bind(&provider.provider_status)
    .bind(&provider.llm_context_card)
    .bind(&provider.service_zip_codes)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn insert_host(pool: &PgPool, host: &HostProfile, excluded_terms: &[&str]) -> Result<()> {
    let excluded: Vec<String> = excluded_terms.iter().map(|t| t.to_string()).collect();

    sqlx::query(
        r#"
        INSERT INTO providers (
            id, name, is_active, provider_status, is_host, host_embed_active,
            host_monthly_token_budget, host_tokens_used_this_month,
            host_search_rate_limit_per_minute, host_excluded_search_terms
        )
        VALUES ($1, $2, $3, 'active', $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(host.id)
    .bind(&host.name)
    .bind(host.is_active)
    .bind(host.is_host)
    .bind(host.host_embed_active)
    .bind(host.host_monthly_token_budget)
    .bind(host.host_tokens_used_this_month)
    .bind(host.host_search_rate_limit_per_minute)
    .bind(&excluded)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn insert_location(pool: &PgPool, location: &Location) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO locations (
            id, provider_id, name, address_line_1, city, state, postal_code,
            latitude, longitude, is_primary
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(location.id)
    .bind(location.provider_id)
    .bind(&location.name)
    .bind(&location.address_line_1)
    .bind(&location.city)
    .bind(&location.state)
    .bind(&location.postal_code)
    .bind(location.latitude)
    .bind(location.longitude)
    .bind(location.is_primary)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn insert_need(pool: &PgPool, need: &Need, embedding: Option<Vec<f32>>) -> Result<()> {
    sqlx::query(
        "INSERT INTO needs (id, name, category, synonyms, embedding) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(need.id)
    .bind(&need.name)
    .bind(&need.category)
    .bind(&need.synonyms)
    .bind(embedding.map(Vector::from))
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn link_need(pool: &PgPool, provider_id: ProviderId, need_id: NeedId) -> Result<()> {
    sqlx::query("INSERT INTO provider_needs (provider_id, need_id) VALUES ($1, $2)")
        .bind(provider_id)
        .bind(need_id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn insert_crisis_keyword(
    pool: &PgPool,
    keyword: &str,
    crisis_type: &str,
    severity: i32,
    is_active: bool,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO crisis_keywords (keyword, crisis_type, severity, is_active)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (keyword) DO NOTHING
        "#,
    )
    .bind(keyword)
    .bind(crisis_type)
    .bind(severity)
    .bind(is_active)
    .execute(pool)
    .await?;

    Ok(())
}
