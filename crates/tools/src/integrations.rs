//! External System Integrations
//!
//! Traits for the two lookup services behind the location resolver, plus
//! in-memory stubs for development and testing.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use thiserror::Error;

use vetchat_core::{Facility, GeoResult};

/// Service name reported for geocoding failures
pub const GEOCODER_SERVICE: &str = "geocoder";

/// Service name reported for facility-directory failures
pub const FACILITIES_SERVICE: &str = "facilities";

/// Integration errors
#[derive(Error, Debug)]
pub enum IntegrationError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntegrationError {
    /// Attribute the failure to a collaborator
    pub fn into_external(self, service: &str) -> vetchat_core::Error {
        vetchat_core::Error::external(service, self.to_string())
    }
}

impl From<reqwest::Error> for IntegrationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            IntegrationError::Timeout
        } else if err.is_decode() {
            IntegrationError::InvalidResponse(err.to_string())
        } else {
            IntegrationError::ConnectionFailed(err.to_string())
        }
    }
}

/// Map a non-success response to an error, keeping a bounded slice of the body
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, IntegrationError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let mut body = response.text().await.unwrap_or_default();
    if let Some((idx, _)) = body.char_indices().nth(200) {
        body.truncate(idx);
    }

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => IntegrationError::AuthFailed(body),
        StatusCode::TOO_MANY_REQUESTS => IntegrationError::RateLimited,
        _ => IntegrationError::Api {
            status: status.as_u16(),
            message: body,
        },
    })
}

// ============================================================================
// Geocoding
// ============================================================================

/// Geocoding service
///
/// Resolves free text (postal code or place name) to its best single match.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` when the service knows no such place
    async fn geocode(&self, query: &str) -> Result<Option<GeoResult>, IntegrationError>;
}

/// Stub geocoder for development/testing
///
/// Answers every query with the same fixture and counts calls.
#[derive(Default)]
pub struct StubGeocoder {
    result: Option<GeoResult>,
    fail: bool,
    calls: AtomicUsize,
}

impl StubGeocoder {
    /// Resolve every query to `result`
    pub fn found(result: GeoResult) -> Self {
        Self {
            result: Some(result),
            ..Default::default()
        }
    }

    /// Know no place at all
    pub fn not_found() -> Self {
        Self::default()
    }

    /// Fail every call with a timeout
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    /// Number of geocode calls made
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<GeoResult>, IntegrationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tracing::info!(query = %query, "Stub Geocoder: geocode");

        if self.fail {
            return Err(IntegrationError::Timeout);
        }
        Ok(self.result.clone())
    }
}

// ============================================================================
// Facility directory
// ============================================================================

/// Facility directory service
#[async_trait]
pub trait FacilityDirectory: Send + Sync {
    /// Facilities within `radius_miles` of `location`, at most `limit`, in the
    /// order the service returns them
    async fn nearby(
        &self,
        location: &GeoResult,
        radius_miles: u32,
        limit: usize,
    ) -> Result<Vec<Facility>, IntegrationError>;
}

/// Stub facility directory for development/testing
///
/// Returns its fixture unchanged (ignoring `limit`) and records the radius it
/// was asked for.
#[derive(Default)]
pub struct StubFacilityDirectory {
    facilities: Vec<Facility>,
    fail: bool,
    calls: AtomicUsize,
    last_radius: AtomicU32,
}

impl StubFacilityDirectory {
    pub fn new(facilities: Vec<Facility>) -> Self {
        Self {
            facilities,
            ..Default::default()
        }
    }

    /// Fail every call with an authentication error
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    /// Number of nearby calls made
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Radius of the most recent call
    pub fn last_radius(&self) -> u32 {
        self.last_radius.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FacilityDirectory for StubFacilityDirectory {
    async fn nearby(
        &self,
        location: &GeoResult,
        radius_miles: u32,
        limit: usize,
    ) -> Result<Vec<Facility>, IntegrationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_radius.store(radius_miles, Ordering::SeqCst);
        tracing::info!(
            lat = location.latitude,
            lon = location.longitude,
            radius_miles,
            limit,
            "Stub Facilities: nearby"
        );

        if self.fail {
            return Err(IntegrationError::AuthFailed("invalid apikey".to_string()));
        }
        Ok(self.facilities.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dallas() -> GeoResult {
        GeoResult {
            latitude: 32.78,
            longitude: -96.80,
            display_name: "Dallas, TX".to_string(),
        }
    }

    #[tokio::test]
    async fn test_stub_geocoder() {
        let geocoder = StubGeocoder::found(dallas());
        let result = geocoder.geocode("dallas").await.unwrap();
        assert_eq!(result, Some(dallas()));
        assert_eq!(geocoder.calls(), 1);

        let geocoder = StubGeocoder::not_found();
        assert!(geocoder.geocode("atlantis").await.unwrap().is_none());

        let geocoder = StubGeocoder::failing();
        assert!(matches!(
            geocoder.geocode("dallas").await,
            Err(IntegrationError::Timeout)
        ));
    }

    #[tokio::test]
    async fn test_stub_directory_records_radius() {
        let directory = StubFacilityDirectory::new(vec![Facility {
            name: "Dallas VA Medical Center".to_string(),
            phone: None,
            url: None,
        }]);

        let facilities = directory.nearby(&dallas(), 50, 5).await.unwrap();
        assert_eq!(facilities.len(), 1);
        assert_eq!(directory.calls(), 1);
        assert_eq!(directory.last_radius(), 50);
    }

    #[test]
    fn test_into_external() {
        let err = IntegrationError::RateLimited.into_external(GEOCODER_SERVICE);
        assert_eq!(err.service(), Some("geocoder"));
        assert_eq!(err.to_string(), "geocoder failed: Rate limited");
    }
}
