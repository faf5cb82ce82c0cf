//! OpenStreetMap Nominatim geocoder

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use vetchat_config::GeocodingConfig;
use vetchat_core::GeoResult;

use crate::integrations::{check_status, Geocoder, IntegrationError};

/// Nominatim search API client
///
/// Asks for the single best match (`limit=1`). Nominatim's usage policy
/// requires an identifying User-Agent, which is set on the client.
pub struct NominatimGeocoder {
    client: Client,
    config: GeocodingConfig,
}

impl NominatimGeocoder {
    pub fn new(config: GeocodingConfig) -> Result<Self, IntegrationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| IntegrationError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.config.endpoint.trim_end_matches('/'))
    }

    fn search_params(&self, query: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("q", query.to_string()),
            ("format", "json".to_string()),
            ("limit", "1".to_string()),
        ];
        if let Some(codes) = self
            .config
            .country_codes
            .as_deref()
            .filter(|c| !c.trim().is_empty())
        {
            params.push(("countrycodes", codes.to_string()));
        }
        params
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<GeoResult>, IntegrationError> {
        let response = self
            .client
            .get(self.search_url())
            .query(&self.search_params(query))
            .send()
            .await?;

        let places: Vec<NominatimPlace> = check_status(response).await?.json().await?;

        let result = places.into_iter().next().map(GeoResult::try_from).transpose()?;
        tracing::debug!(query = %query, found = result.is_some(), "Geocoded location");
        Ok(result)
    }
}

// Nominatim API types; coordinates arrive as strings
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: String,
}

impl TryFrom<NominatimPlace> for GeoResult {
    type Error = IntegrationError;

    fn try_from(place: NominatimPlace) -> Result<Self, Self::Error> {
        let parse = |field: &str, value: &str| {
            value
                .trim()
                .parse::<f64>()
                .map_err(|_| IntegrationError::InvalidResponse(format!("bad {}: {:?}", field, value)))
        };

        Ok(GeoResult {
            latitude: parse("lat", &place.lat)?,
            longitude: parse("lon", &place.lon)?,
            display_name: place.display_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DALLAS: &str = r#"[{
        "place_id": 308370213,
        "lat": "32.7762719",
        "lon": "-96.7968559",
        "display_name": "Dallas, Dallas County, Texas, United States",
        "type": "city"
    }]"#;

    #[test]
    fn test_parse_place() {
        let places: Vec<NominatimPlace> = serde_json::from_str(DALLAS).unwrap();
        let geo = GeoResult::try_from(places.into_iter().next().unwrap()).unwrap();
        assert!((geo.latitude - 32.776).abs() < 0.001);
        assert!((geo.longitude + 96.797).abs() < 0.001);
        assert_eq!(geo.display_name, "Dallas, Dallas County, Texas, United States");
    }

    #[test]
    fn test_parse_empty_result() {
        let places: Vec<NominatimPlace> = serde_json::from_str("[]").unwrap();
        assert!(places.is_empty());
    }

    #[test]
    fn test_rejects_bad_coordinates() {
        let place = NominatimPlace {
            lat: "north".to_string(),
            lon: "-96.8".to_string(),
            display_name: "Nowhere".to_string(),
        };
        assert!(matches!(
            GeoResult::try_from(place),
            Err(IntegrationError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_search_request() {
        let geocoder = NominatimGeocoder::new(GeocodingConfig {
            endpoint: "https://nominatim.example.org/".to_string(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(geocoder.search_url(), "https://nominatim.example.org/search");
        let params = geocoder.search_params("75201");
        assert!(params.contains(&("q", "75201".to_string())));
        assert!(params.contains(&("limit", "1".to_string())));
        assert!(params.contains(&("countrycodes", "us".to_string())));
    }

    #[test]
    fn test_country_filter_optional() {
        let geocoder = NominatimGeocoder::new(GeocodingConfig {
            country_codes: None,
            ..Default::default()
        })
        .unwrap();
        assert!(!geocoder
            .search_params("paris")
            .iter()
            .any(|(k, _)| *k == "countrycodes"));
    }
}
