use std::collections::HashMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{NeedId, ProviderId};
use crate::domains::locations::Location;
use crate::domains::needs::Need;

/// Provider organization as returned to search callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub id: ProviderId,
    pub name: String,
    pub description: Option<String>,

    // Contact
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,

    // Classification
    pub sector: Option<String>,
    pub referral_type: Option<String>,

    pub is_active: bool,
    pub provider_status: String,

    /// Free-text briefing for the summarizer. Internal only, never sent to clients.
    #[serde(skip_serializing, default)]
    pub llm_context_card: Option<String>,

    /// ZIP codes served; `None` or empty means everywhere.
    pub service_zip_codes: Option<Vec<String>>,
}

impl Provider {
    /// Non-blank context card, if any.
    pub fn context_card(&self) -> Option<&str> {
        self.llm_context_card
            .as_deref()
            .map(str::trim)
            .filter(|card| !card.is_empty())
    }

    /// Active providers offering at least one of `need_ids`.
    ///
    /// When `within` is given only those provider ids are considered. No
    /// ordering is applied; callers rank in-process.
    pub async fn find_active_offering_needs(
        need_ids: &[NeedId],
        within: Option<&[ProviderId]>,
        limit: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let providers = sqlx::query_as::<_, Self>(
            r#"
            SELECT p.id, p.name, p.description, p.phone, p.email, p.website,
                   p.sector, p.referral_type, p.is_active, p.provider_status,
                   p.llm_context_card, p.service_zip_codes
            FROM providers p
            WHERE p.provider_status = 'active'
              AND EXISTS (
                  SELECT 1 FROM provider_needs pn
                  WHERE pn.provider_id = p.id AND pn.need_id = ANY($1)
              )
              AND ($2::uuid[] IS NULL OR p.id = ANY($2))
            LIMIT $3
            "#,
        )
        .bind(need_ids)
        .bind(within)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(providers)
    }

    /// Ids of active providers with a location within `radius_meters` of the point.
    pub async fn ids_within_radius(
        lat: f64,
        lng: f64,
        radius_meters: f64,
        pool: &PgPool,
    ) -> Result<Vec<ProviderId>> {
        let ids: Vec<(ProviderId,)> =
            sqlx::query_as("SELECT provider_id FROM provider_ids_within_radius($1, $2, $3)")
                .bind(lat)
                .bind(lng)
                .bind(radius_meters)
                .fetch_all(pool)
                .await?;

        Ok(ids.into_iter().map(|(id,)| id).collect())
    }
}

/// A provider with its locations and offered needs eagerly loaded
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderWithRelations {
    pub provider: Provider,
    pub locations: Vec<Location>,
    pub needs: Vec<Need>,
}

impl ProviderWithRelations {
    /// Attaches locations and needs to `providers` with two batched queries,
    /// keeping the input order.
    pub async fn load(providers: Vec<Provider>, pool: &PgPool) -> Result<Vec<Self>> {
        if providers.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<ProviderId> = providers.iter().map(|p| p.id).collect();
        let mut locations: HashMap<ProviderId, Vec<Location>> = HashMap::new();
        for location in Location::find_for_providers(&ids, pool).await? {
            locations.entry(location.provider_id).or_default().push(location);
        }

        let mut needs: HashMap<ProviderId, Vec<Need>> = HashMap::new();
        for row in Need::find_for_providers(&ids, pool).await? {
            needs.entry(row.provider_id).or_default().push(row.need);
        }

        Ok(providers
            .into_iter()
            .map(|provider| Self {
                locations: locations.remove(&provider.id).unwrap_or_default(),
                needs: needs.remove(&provider.id).unwrap_or_default(),
                provider,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(card: Option<&str>) -> Provider {
        Provider {
            id: ProviderId::new(),
            name: "St. Johns Housing Partnership".to_string(),
            description: None,
            phone: Some("904-555-0100".to_string()),
            email: None,
            website: None,
            sector: Some("nonprofit".to_string()),
            referral_type: Some("standard".to_string()),
            is_active: true,
            provider_status: "active".to_string(),
            llm_context_card: card.map(String::from),
            service_zip_codes: None,
        }
    }

    #[test]
    fn test_context_card_is_never_serialized() {
        let json = serde_json::to_value(provider(Some("Internal briefing"))).unwrap();
        assert!(json.get("llmContextCard").is_none());
        assert_eq!(json["name"], "St. Johns Housing Partnership");
        assert_eq!(json["providerStatus"], "active");
    }

    #[test]
    fn test_blank_context_card_is_ignored() {
        assert_eq!(provider(Some("   ")).context_card(), None);
        assert_eq!(provider(Some(" Rent help ")).context_card(), Some("Rent help"));
        assert_eq!(provider(None).context_card(), None);
    }
}
