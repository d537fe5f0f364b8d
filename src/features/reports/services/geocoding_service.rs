use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core::config::GeocodingConfig;
use crate::core::error::{AppError, Result};

/// Warning returned with a report whose location could not be resolved
pub const GEOCODING_FAILED_WARNING: &str =
    "Attempt to locate coordinates for provided location failed!";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Resolves a free-form address to coordinates.
///
/// `Ok(None)` means the lookup worked but found nothing.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, query: &str) -> Result<Option<Coordinates>>;
}

/// Nominatim search result; only the fields used here
#[derive(Debug, Deserialize)]
pub struct NominatimPlace {
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl NominatimPlace {
    fn coordinates(&self) -> Option<Coordinates> {
        let latitude = self.lat.trim().parse::<f64>().ok()?;
        let longitude = self.lon.trim().parse::<f64>().ok()?;

        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return None;
        }
        Some(Coordinates {
            latitude,
            longitude,
        })
    }
}

/// Geocoder backed by the Nominatim search API
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
    country_codes: String,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocodingConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("RipotiTaka/1.0 (waste-reporting)")
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build geocoding client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            country_codes: config.country_codes.clone(),
        })
    }

    fn search_url(&self, query: &str) -> String {
        let mut url = format!(
            "{}/search?q={}&format=json&limit=1",
            self.base_url,
            urlencoding::encode(query)
        );
        if !self.country_codes.is_empty() {
            url.push_str("&countrycodes=");
            url.push_str(&urlencoding::encode(&self.country_codes));
        }
        url
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<Coordinates>> {
        let url = self.search_url(query);
        tracing::debug!("Geocoding '{}' -> {}", query, url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            AppError::ExternalServiceError(format!("Nominatim request failed: {}", e))
        })?;

        if !response.status().is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "Nominatim returned status {}",
                response.status()
            )));
        }

        let places: Vec<NominatimPlace> = response.json().await.map_err(|e| {
            AppError::ExternalServiceError(format!("Failed to parse Nominatim response: {}", e))
        })?;

        let found = places.first().and_then(NominatimPlace::coordinates);
        if let (Some(place), Some(coords)) = (places.first(), found) {
            tracing::debug!(
                "Geocoded '{}' to {:?} ({})",
                query,
                coords,
                place.display_name.as_deref().unwrap_or("-")
            );
        }
        Ok(found)
    }
}

/// Look up coordinates without ever failing the caller.
///
/// Returns the coordinates, or the warning to surface when none were found.
pub async fn locate(geocoder: &dyn Geocoder, query: &str) -> (Option<Coordinates>, Option<String>) {
    match geocoder.geocode(query).await {
        Ok(Some(coords)) => (Some(coords), None),
        Ok(None) => {
            tracing::warn!("No coordinates found for location '{}'", query);
            (None, Some(GEOCODING_FAILED_WARNING.to_string()))
        }
        Err(e) => {
            tracing::warn!("Geocoding '{}' failed: {}", query, e);
            (None, Some(GEOCODING_FAILED_WARNING.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct FixedGeocoder(Option<Coordinates>);

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn geocode(&self, _query: &str) -> Result<Option<Coordinates>> {
            Ok(self.0)
        }
    }

    struct BrokenGeocoder;

    #[async_trait]
    impl Geocoder for BrokenGeocoder {
        async fn geocode(&self, _query: &str) -> Result<Option<Coordinates>> {
            Err(AppError::ExternalServiceError("timed out".to_string()))
        }
    }

    fn place(lat: &str, lon: &str) -> NominatimPlace {
        NominatimPlace {
            lat: lat.to_string(),
            lon: lon.to_string(),
            display_name: None,
        }
    }

    #[test]
    fn test_place_coordinates_parse() {
        let coords = place("-1.2921", "36.8219").coordinates().unwrap();
        assert_eq!(coords.latitude, -1.2921);
        assert_eq!(coords.longitude, 36.8219);
    }

    #[test]
    fn test_place_with_bad_coordinates_is_ignored() {
        assert!(place("north", "36.8").coordinates().is_none());
        assert!(place("95.0", "36.8").coordinates().is_none());
    }

    #[test]
    fn test_nominatim_payload_deserializes() {
        let body = r#"[{"place_id": 1, "lat": "-4.0435", "lon": "39.6682", "display_name": "Mombasa, Kenya"}]"#;
        let places: Vec<NominatimPlace> = serde_json::from_str(body).unwrap();
        assert_eq!(places.len(), 1);
        assert!(places[0].coordinates().is_some());
    }

    #[test]
    fn test_search_url_is_encoded_and_scoped() {
        let geocoder = NominatimGeocoder::new(&GeocodingConfig {
            base_url: "https://nominatim.example.org".to_string(),
            country_codes: "ke".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap();

        assert_eq!(
            geocoder.search_url("Moi Avenue, Nairobi"),
            "https://nominatim.example.org/search?q=Moi%20Avenue%2C%20Nairobi&format=json&limit=1&countrycodes=ke"
        );
    }

    #[tokio::test]
    async fn test_locate_found() {
        let coords = Coordinates {
            latitude: -1.28,
            longitude: 36.82,
        };
        let (found, warning) = locate(&FixedGeocoder(Some(coords)), "Nairobi").await;
        assert_eq!(found, Some(coords));
        assert!(warning.is_none());
    }

    #[tokio::test]
    async fn test_locate_degrades_to_warning() {
        let (found, warning) = locate(&FixedGeocoder(None), "Nowhere").await;
        assert!(found.is_none());
        assert_eq!(warning.as_deref(), Some(GEOCODING_FAILED_WARNING));

        let (found, warning) = locate(&BrokenGeocoder, "Nairobi").await;
        assert!(found.is_none());
        assert_eq!(warning.as_deref(), Some(GEOCODING_FAILED_WARNING));
    }
}
