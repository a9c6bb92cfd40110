use anyhow::Result;
use sqlx::PgPool;

use crate::common::ProviderId;

/// Host-facing view of a provider row: the columns that gate embedded search.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct HostProfile {
    pub id: ProviderId,
    pub name: String,
    pub is_active: bool,
    pub is_host: bool,
    pub host_embed_active: bool,
    pub host_monthly_token_budget: Option<i64>,
    pub host_tokens_used_this_month: i64,
    pub host_search_rate_limit_per_minute: Option<i32>,
}

impl HostProfile {
    /// Whether this provider may serve search traffic as a host.
    pub fn can_host_search(&self) -> bool {
        self.is_active && self.is_host && self.host_embed_active
    }

    /// A budget of zero or less is treated as unlimited.
    pub fn budget_exhausted(&self) -> bool {
        match self.host_monthly_token_budget {
            Some(budget) if budget > 0 => self.host_tokens_used_this_month >= budget,
            _ => false,
        }
    }

    /// Requests per minute allowed per caller IP, falling back to `default`.
    pub fn rate_limit_per_minute(&self, default: u32) -> u32 {
        self.host_search_rate_limit_per_minute
            .and_then(|limit| u32::try_from(limit).ok())
            .filter(|limit| *limit > 0)
            .unwrap_or(default)
    }

    pub async fn find_by_id(id: ProviderId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT id, name, is_active, is_host, host_embed_active,
                   host_monthly_token_budget, host_tokens_used_this_month,
                   host_search_rate_limit_per_minute
            FROM providers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Lowercased, non-blank excluded search terms for a host.
    pub async fn excluded_terms(id: ProviderId, pool: &PgPool) -> Result<Vec<String>> {
        let terms = sqlx::query_scalar::<_, Option<Vec<String>>>(
            "SELECT host_excluded_search_terms FROM providers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?
        .flatten();

        Ok(terms
            .unwrap_or_default()
            .into_iter()
            .map(|term| term.trim().to_lowercase())
            .filter(|term| !term.is_empty())
            .collect())
    }

    /// Adds `tokens` to the host's monthly counter in one statement.
    pub async fn increment_token_usage(id: ProviderId, tokens: i64, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE providers
            SET host_tokens_used_this_month = host_tokens_used_this_month + $2,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(tokens.max(0))
        .execute(pool)
        .await?;

        Ok(())
    }
}
