use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::common::Coordinates;
use crate::kernel::BaseGeocoder;

/// Mean Earth radius used for every distance shown to callers.
pub const EARTH_RADIUS_MILES: f64 = 3959.0;

/// Nominatim API response for geocoding
#[derive(Debug, Deserialize)]
struct NominatimResponse {
    lat: String,
    lon: String,
}

/// Resolves US postal codes through Nominatim (OpenStreetMap).
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
    user_agent: String,
    timeout: Duration,
}

impl NominatimGeocoder {
    pub fn new(base_url: impl Into<String>, user_agent: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_agent: user_agent.into(),
            timeout,
        }
    }
}

#[async_trait]
impl BaseGeocoder for NominatimGeocoder {
    #[instrument(skip(self))]
    async fn geocode_postal_code(&self, postal_code: &str) -> Result<Option<Coordinates>> {
        let url = format!(
            "{}/search?postalcode={}&countrycodes=us&format=json&limit=1",
            self.base_url,
            urlencoding::encode(postal_code)
        );

        let response: Vec<NominatimResponse> = self
            .client
            .get(&url)
            .header("User-Agent", &self.user_agent)
            .timeout(self.timeout)
            .send()
            .await
            .context("Geocoding API request failed")?
            .error_for_status()
            .context("Geocoding API returned an error status")?
            .json()
            .await
            .context("Failed to parse geocoding response")?;

        let Some(result) = response.first() else {
            debug!(postal_code, "Postal code not found by geocoding API");
            return Ok(None);
        };

        let lat: f64 = result
            .lat
            .parse()
            .map_err(|e| anyhow!("Invalid latitude in response: {}", e))?;
        let lng: f64 = result
            .lon
            .parse()
            .map_err(|e| anyhow!("Invalid longitude in response: {}", e))?;

        Ok(Some(Coordinates::new(lat, lng)))
    }
}

/// Tries each geocoder in order and returns the first hit.
///
/// A failing source is logged and skipped, so a flaky remote service cannot
/// hide an answer a later source would have given.
pub struct ChainedGeocoder {
    sources: Vec<Arc<dyn BaseGeocoder>>,
}

impl ChainedGeocoder {
    pub fn new(sources: Vec<Arc<dyn BaseGeocoder>>) -> Self {
        Self { sources }
    }
}

#[async_trait]
impl BaseGeocoder for ChainedGeocoder {
    async fn geocode_postal_code(&self, postal_code: &str) -> Result<Option<Coordinates>> {
        let mut last_error = None;

        for source in &self.sources {
            match source.geocode_postal_code(postal_code).await {
                Ok(Some(coords)) => return Ok(Some(coords)),
                Ok(None) => continue,
                Err(e) => {
                    warn!(error = %e, postal_code, "Geocoder source failed, trying next");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }
}

/// Great-circle distance between two points in miles (haversine formula).
pub fn haversine_miles(from: Coordinates, to: Coordinates) -> f64 {
    let dlat = (to.lat - from.lat).to_radians();
    let dlng = (to.lng - from.lng).to_radians();

    let a = (dlat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (dlng / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_MILES * c
}

/// Rounds to one decimal place, the precision distances are reported at.
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ST_AUGUSTINE: Coordinates = Coordinates { lat: 29.9012, lng: -81.3124 };
    const JACKSONVILLE: Coordinates = Coordinates { lat: 30.3322, lng: -81.6557 };

    #[test]
    fn test_haversine_known_distance() {
        // St. Augustine to Jacksonville is roughly 36 miles as the crow flies
        let distance = haversine_miles(ST_AUGUSTINE, JACKSONVILLE);
        assert!(distance > 34.0 && distance < 38.0, "got {}", distance);
    }

    #[test]
    fn test_haversine_is_symmetric() {
        let pairs = [
            (ST_AUGUSTINE, JACKSONVILLE),
            (Coordinates::new(44.98, -93.27), Coordinates::new(-33.87, 151.21)),
            (Coordinates::new(0.0, 179.9), Coordinates::new(0.0, -179.9)),
        ];

        for (a, b) in pairs {
            let there = haversine_miles(a, b);
            let back = haversine_miles(b, a);
            assert!((there - back).abs() < 1e-9, "{} vs {}", there, back);
        }
    }

    #[test]
    fn test_haversine_same_point_is_zero() {
        assert_eq!(haversine_miles(JACKSONVILLE, JACKSONVILLE), 0.0);
    }

    #[test]
    fn test_round_to_tenth() {
        assert_eq!(round_to_tenth(3.24), 3.2);
        assert_eq!(round_to_tenth(3.25), 3.3);
        assert_eq!(round_to_tenth(7.0), 7.0);
    }

    struct FixedGeocoder {
        answer: Result<Option<Coordinates>, &'static str>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl BaseGeocoder for FixedGeocoder {
        async fn geocode_postal_code(&self, _postal_code: &str) -> Result<Option<Coordinates>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.map_err(|e| anyhow!(e))
        }
    }

    fn fixed(answer: Result<Option<Coordinates>, &'static str>) -> Arc<FixedGeocoder> {
        Arc::new(FixedGeocoder {
            answer,
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_chain_stops_at_first_hit() {
        let first = fixed(Ok(Some(ST_AUGUSTINE)));
        let second = fixed(Ok(Some(JACKSONVILLE)));
        let chain = ChainedGeocoder::new(vec![first.clone(), second.clone()]);

        let result = chain.geocode_postal_code("32084").await.unwrap();

        assert_eq!(result, Some(ST_AUGUSTINE));
        assert_eq!(second.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_chain_skips_failing_source() {
        let chain = ChainedGeocoder::new(vec![
            fixed(Err("table unavailable")),
            fixed(Ok(Some(JACKSONVILLE))),
        ]);

        let result = chain.geocode_postal_code("32202").await.unwrap();
        assert_eq!(result, Some(JACKSONVILLE));
    }

    #[tokio::test]
    async fn test_chain_reports_error_when_nothing_found() {
        let chain = ChainedGeocoder::new(vec![fixed(Ok(None)), fixed(Err("network down"))]);
        assert!(chain.geocode_postal_code("00000").await.is_err());

        let chain = ChainedGeocoder::new(vec![fixed(Ok(None))]);
        assert_eq!(chain.geocode_postal_code("00000").await.unwrap(), None);
    }
}
