use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use typed_builder::TypedBuilder;

use crate::common::{Coordinates, ProviderId, SearchSessionId};

/// One conversation with the search assistant.
///
/// Counters are only ever changed through [`SearchSession::increment_usage`],
/// which runs server-side so concurrent requests cannot lose updates.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SearchSession {
    pub id: SearchSessionId,
    pub initial_query: String,
    pub message_count: i32,
    pub total_tokens_used: i64,
    pub model: String,
    pub user_lat: Option<f64>,
    pub user_lng: Option<f64>,
    pub zip_code_searched: Option<String>,
    pub host_provider_id: Option<ProviderId>,
    pub search_radius_miles: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row written on the first query of a conversation
#[derive(Debug, Clone, PartialEq, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct NewSearchSession {
    pub initial_query: String,
    #[builder(default)]
    pub total_tokens_used: i64,
    pub model: String,
    #[builder(default)]
    pub user_location: Option<Coordinates>,
    #[builder(default)]
    pub zip_code_searched: Option<String>,
    #[builder(default)]
    pub host_provider_id: Option<ProviderId>,
    #[builder(default)]
    pub search_radius_miles: Option<i32>,
}

impl SearchSession {
    pub async fn create(session: &NewSearchSession, pool: &PgPool) -> Result<SearchSessionId> {
        let id = SearchSessionId::new();
        let (lat, lng) = session
            .user_location
            .map(|c| (Some(c.lat), Some(c.lng)))
            .unwrap_or((None, None));

        // point(x, y) is (longitude, latitude)
        sqlx::query(
            r#"
            INSERT INTO search_sessions (
                id, initial_query, message_count, total_tokens_used, model,
                user_location, zip_code_searched, host_provider_id, search_radius_miles
            )
            VALUES (
                $1, $2, 1, $3, $4,
                CASE WHEN $5::float8 IS NULL OR $6::float8 IS NULL THEN NULL ELSE point($6, $5) END,
                $7, $8, $9
            )
            "#,
        )
        .bind(id)
        .bind(&session.initial_query)
        .bind(session.total_tokens_used.max(0))
        .bind(&session.model)
        .bind(lat)
        .bind(lng)
        .bind(&session.zip_code_searched)
        .bind(session.host_provider_id)
        .bind(session.search_radius_miles)
        .execute(pool)
        .await?;

        Ok(id)
    }

    pub async fn find_by_id(id: SearchSessionId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT id, initial_query, message_count, total_tokens_used, model,
                   (user_location)[1] AS user_lat, (user_location)[0] AS user_lng,
                   zip_code_searched, host_provider_id, search_radius_miles,
                   created_at, updated_at
            FROM search_sessions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Counts one more message and adds `tokens` to the running total.
    pub async fn increment_usage(id: SearchSessionId, tokens: i64, pool: &PgPool) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE search_sessions
            SET message_count = message_count + 1,
                total_tokens_used = total_tokens_used + $2,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(tokens.max(0))
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            bail!("search session {} not found", id);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let session = NewSearchSession::builder()
            .initial_query("food pantry")
            .model("gpt-4o-mini")
            .build();

        assert_eq!(session.total_tokens_used, 0);
        assert_eq!(session.user_location, None);
        assert_eq!(session.zip_code_searched, None);
        assert_eq!(session.host_provider_id, None);
        assert_eq!(session.search_radius_miles, None);
    }
}
