use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::common::Coordinates;
use crate::kernel::BaseGeocoder;

/// Explicit coordinates, if usable.
fn explicit_location(location: Option<Coordinates>) -> Option<Coordinates> {
    match location {
        Some(coords) if coords.is_valid() => Some(coords),
        Some(coords) => {
            warn!(lat = coords.lat, lng = coords.lng, "Ignoring out-of-range coordinates");
            None
        }
        None => None,
    }
}

/// Geocodes `zip`. Not found, errors and timeouts all yield `None`.
#[instrument(skip(geocoder))]
pub async fn geocode_zip(
    zip: &str,
    geocoder: &dyn BaseGeocoder,
    timeout: Duration,
) -> Option<Coordinates> {
    match tokio::time::timeout(timeout, geocoder.geocode_postal_code(zip)).await {
        Ok(Ok(Some(coords))) if coords.is_valid() => Some(coords),
        Ok(Ok(Some(_))) => {
            warn!("Geocoder returned out-of-range coordinates");
            None
        }
        Ok(Ok(None)) => {
            debug!("ZIP code not found");
            None
        }
        Ok(Err(e)) => {
            warn!(error = %e, "Geocoding failed, continuing without location");
            None
        }
        Err(_) => {
            warn!(timeout = ?timeout, "Geocoding timed out, continuing without location");
            None
        }
    }
}

/// Caller location: explicit coordinates first, then the geocoded ZIP.
pub async fn resolve_location(
    explicit: Option<Coordinates>,
    zip: Option<&str>,
    geocoder: &dyn BaseGeocoder,
    timeout: Duration,
) -> Option<Coordinates> {
    if let Some(coords) = explicit_location(explicit) {
        return Some(coords);
    }

    match zip {
        Some(zip) => geocode_zip(zip, geocoder, timeout).await,
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::kernel::test_dependencies::MockGeocoder;

    /// Never answers
    struct StalledGeocoder;

    #[async_trait]
    impl BaseGeocoder for StalledGeocoder {
        async fn geocode_postal_code(&self, _postal_code: &str) -> anyhow::Result<Option<Coordinates>> {
            std::future::pending().await
        }
    }

    const TIMEOUT: Duration = Duration::from_secs(1);

    fn ponte_vedra() -> Coordinates {
        Coordinates::new(30.2397, -81.3857)
    }

    #[tokio::test]
    async fn test_explicit_location_wins() {
        let geocoder = MockGeocoder::new().with_postal_code("32082", ponte_vedra());
        let explicit = Coordinates::new(29.9, -81.3);

        let resolved = resolve_location(Some(explicit), Some("32082"), &geocoder, TIMEOUT).await;

        assert_eq!(resolved, Some(explicit));
        assert!(geocoder.calls().is_empty());
    }

    #[tokio::test]
    async fn test_zip_is_geocoded_when_no_coordinates() {
        let geocoder = MockGeocoder::new().with_postal_code("32082", ponte_vedra());

        let resolved = resolve_location(None, Some("32082"), &geocoder, TIMEOUT).await;

        assert_eq!(resolved, Some(ponte_vedra()));
        assert_eq!(geocoder.calls(), vec!["32082".to_string()]);
    }

    #[tokio::test]
    async fn test_invalid_explicit_coordinates_fall_back_to_zip() {
        let geocoder = MockGeocoder::new().with_postal_code("32082", ponte_vedra());

        let resolved = resolve_location(
            Some(Coordinates::new(123.0, 0.0)),
            Some("32082"),
            &geocoder,
            TIMEOUT,
        )
        .await;

        assert_eq!(resolved, Some(ponte_vedra()));
    }

    #[tokio::test]
    async fn test_geocoder_failure_degrades_to_none() {
        let geocoder = MockGeocoder::new().failing();
        assert_eq!(resolve_location(None, Some("32082"), &geocoder, TIMEOUT).await, None);
    }

    #[tokio::test]
    async fn test_unknown_zip_is_none() {
        let geocoder = MockGeocoder::new();
        assert_eq!(resolve_location(None, Some("00000"), &geocoder, TIMEOUT).await, None);
    }

    #[tokio::test]
    async fn test_no_inputs_is_none() {
        let geocoder = MockGeocoder::new();
        assert_eq!(resolve_location(None, None, &geocoder, TIMEOUT).await, None);
        assert!(geocoder.calls().is_empty());
    }

    #[tokio::test]
    async fn test_geocoder_timeout_degrades_to_none() {
        let resolved =
            resolve_location(None, Some("32082"), &StalledGeocoder, Duration::from_millis(20)).await;
        assert_eq!(resolved, None);
    }
}
