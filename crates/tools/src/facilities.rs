//! VA Lighthouse Facilities directory

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use vetchat_config::FacilitiesConfig;
use vetchat_core::{Facility, GeoResult};

use crate::integrations::{check_status, FacilityDirectory, IntegrationError};

/// VA Facilities API client
///
/// Results come back ordered by distance from the given point.
pub struct VaFacilitiesDirectory {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl VaFacilitiesDirectory {
    pub fn new(config: &FacilitiesConfig) -> Result<Self, IntegrationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| IntegrationError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        let api_key = config.api_key.clone().filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            tracing::warn!("No VA facilities API key configured; lookups will be rejected");
        }

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn facilities_url(&self) -> String {
        format!("{}/facilities", self.endpoint)
    }

    fn query_params(location: &GeoResult, radius_miles: u32, limit: usize) -> Vec<(&'static str, String)> {
        vec![
            ("lat", location.latitude.to_string()),
            ("long", location.longitude.to_string()),
            ("radius", radius_miles.to_string()),
            ("per_page", limit.to_string()),
        ]
    }
}

#[async_trait]
impl FacilityDirectory for VaFacilitiesDirectory {
    async fn nearby(
        &self,
        location: &GeoResult,
        radius_miles: u32,
        limit: usize,
    ) -> Result<Vec<Facility>, IntegrationError> {
        let mut request = self
            .client
            .get(self.facilities_url())
            .query(&Self::query_params(location, radius_miles, limit));

        if let Some(ref key) = self.api_key {
            request = request.header("apikey", key);
        }

        let response: FacilitiesResponse = check_status(request.send().await?).await?.json().await?;

        let facilities: Vec<Facility> = response
            .data
            .into_iter()
            .take(limit)
            .map(Facility::from)
            .collect();

        tracing::debug!(
            lat = location.latitude,
            lon = location.longitude,
            radius_miles,
            count = facilities.len(),
            "Fetched nearby facilities"
        );
        Ok(facilities)
    }
}

// VA Facilities API types
#[derive(Debug, Deserialize)]
struct FacilitiesResponse {
    #[serde(default)]
    data: Vec<FacilityRecord>,
}

#[derive(Debug, Deserialize)]
struct FacilityRecord {
    attributes: FacilityAttributes,
}

#[derive(Debug, Deserialize)]
struct FacilityAttributes {
    name: String,
    #[serde(default)]
    phone: Option<FacilityPhones>,
    #[serde(default)]
    website: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FacilityPhones {
    #[serde(default)]
    main: Option<String>,
}

impl From<FacilityRecord> for Facility {
    fn from(record: FacilityRecord) -> Self {
        let attrs = record.attributes;
        Facility {
            name: attrs.name,
            phone: attrs.phone.and_then(|p| p.main),
            url: attrs.website,
        }
    }
}
