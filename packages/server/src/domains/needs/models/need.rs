use anyhow::Result;
use pgvector::Vector;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{NeedId, ProviderId};

/// Taxonomy leaf a provider can offer (e.g. "Housing Assistance")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Need {
    pub id: NeedId,
    pub name: String,
    pub category: Option<String>,
    pub synonyms: Option<Vec<String>>,
}

/// A need returned by semantic search, with its cosine similarity to the query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NeedMatch {
    pub id: NeedId,
    pub name: String,
    pub category: Option<String>,
    pub synonyms: Option<Vec<String>>,
    pub similarity: f64,
}

/// Need offered by a specific provider (join row)
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProviderNeed {
    pub provider_id: ProviderId,
    #[sqlx(flatten)]
    pub need: Need,
}

impl Need {
    /// Text that gets embedded for this need: name, category and synonyms.
    pub fn embedding_text(&self) -> String {
        let mut parts = vec![self.name.clone()];
        if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty()) {
            parts.push(category.to_string());
        }
        if let Some(synonyms) = &self.synonyms {
            parts.extend(synonyms.iter().filter(|s| !s.is_empty()).cloned());
        }
        parts.join(", ")
    }

    /// Needs with similarity >= `threshold` to `query_embedding`, best first.
    ///
    /// Ties on similarity are broken by id so repeated searches are stable.
    pub async fn match_by_embedding(
        query_embedding: &[f32],
        threshold: f64,
        limit: i64,
        pool: &PgPool,
    ) -> Result<Vec<NeedMatch>> {
        let vector = Vector::from(query_embedding.to_vec());

        let matches = sqlx::query_as::<_, NeedMatch>(
            r#"
            SELECT
                id,
                name,
                category,
                synonyms,
                (1 - (embedding <=> $1))::float8 AS similarity
            FROM needs
            WHERE embedding IS NOT NULL
                AND (1 - (embedding <=> $1)) >= $2
            ORDER BY embedding <=> $1, id
            LIMIT $3
            "#,
        )
        .bind(vector)
        .bind(threshold)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(matches)
    }

    /// Needs offered by any of the given providers.
    pub async fn find_for_providers(
        provider_ids: &[ProviderId],
        pool: &PgPool,
    ) -> Result<Vec<ProviderNeed>> {
        let rows = sqlx::query_as::<_, ProviderNeed>(
            r#"
            SELECT pn.provider_id, n.id, n.name, n.category, n.synonyms
            FROM provider_needs pn
            JOIN needs n ON n.id = pn.need_id
            WHERE pn.provider_id = ANY($1)
            ORDER BY pn.provider_id, n.name
            "#,
        )
        .bind(provider_ids)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    pub async fn find_without_embeddings(pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT id, name, category, synonyms FROM needs WHERE embedding IS NULL ORDER BY name",
        )
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn update_embedding(id: NeedId, embedding: &[f32], pool: &PgPool) -> Result<()> {
        let vector = Vector::from(embedding.to_vec());

        sqlx::query("UPDATE needs SET embedding = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(vector)
            .execute(pool)
            .await?;

        Ok(())
    }
}
