use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::common::Coordinates;
use crate::kernel::BaseGeocoder;

/// Reference record for zip code lat/lng lookups
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ZipCode {
    pub zip_code: String,
    pub city: String,
    pub state: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl ZipCode {
    pub async fn find_by_code(zip: &str, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT zip_code, city, state, latitude, longitude FROM zip_codes WHERE zip_code = $1",
        )
        .bind(zip)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// Geocodes from the local `zip_codes` table; no network involved.
pub struct ZipCodeTableGeocoder {
    pool: PgPool,
}

impl ZipCodeTableGeocoder {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseGeocoder for ZipCodeTableGeocoder {
    async fn geocode_postal_code(&self, postal_code: &str) -> Result<Option<Coordinates>> {
        Ok(ZipCode::find_by_code(postal_code, &self.pool)
            .await?
            .map(|zip| zip.coordinates()))
    }
}
