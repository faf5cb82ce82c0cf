//! Error types shared across the pipeline

use thiserror::Error;

/// Pipeline errors
///
/// "Location not found" and "no topic matched" are ordinary reply routes,
/// not errors, and never appear here.
#[derive(Error, Debug)]
pub enum Error {
    /// Caller supplied an unusable request
    #[error("Validation error: {0}")]
    Validation(String),

    /// A geocoding, facility-directory or fallback call failed or timed out
    #[error("{service} failed: {message}")]
    ExternalService { service: String, message: String },

    /// Startup configuration problem (catalog, settings)
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl Error {
    pub fn external(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalService {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Name of the failing collaborator, if this is an external failure
    pub fn service(&self) -> Option<&str> {
        match self {
            Self::ExternalService { service, .. } => Some(service),
            _ => None,
        }
    }

    /// Whether the caller is at fault (maps to a 4xx response)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_error_display() {
        let err = Error::external("geocoder", "timed out");
        assert_eq!(err.to_string(), "geocoder failed: timed out");
        assert_eq!(err.service(), Some("geocoder"));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_validation_is_client_error() {
        assert!(Error::Validation("Message required".into()).is_client_error());
        assert_eq!(Error::Configuration("x".into()).service(), None);
    }
}
