use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{Coordinates, LocationId, ProviderId};

/// Physical site of a provider. At most one per provider should be primary,
/// but nothing in the schema enforces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: LocationId,
    pub provider_id: ProviderId,
    pub name: Option<String>,
    pub address_line_1: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_primary: bool,
}

impl Location {
    /// Both coordinates, when the location has been geocoded.
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
            _ => None,
        }
    }

    /// Locations for a batch of providers, in creation order per provider.
    pub async fn find_for_providers(
        provider_ids: &[ProviderId],
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let locations = sqlx::query_as::<_, Self>(
            r#"
            SELECT id, provider_id, name, address_line_1, city, state, postal_code,
                   latitude, longitude, is_primary
            FROM locations
            WHERE provider_id = ANY($1)
            ORDER BY provider_id, created_at, id
            "#,
        )
        .bind(provider_ids)
        .fetch_all(pool)
        .await?;

        Ok(locations)
    }
}
