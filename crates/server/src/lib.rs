//! VetChat Server
//!
//! HTTP front end for the reply agent: `POST /chat` plus health, readiness and
//! Prometheus endpoints.

pub mod http;
pub mod metrics;
pub mod state;

pub use http::create_router;
pub use metrics::init_metrics;
pub use state::AppState;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Body text for requests without a usable message
pub const MESSAGE_REQUIRED: &str = "Message required";

/// Body text for every internal failure; details only go to the log
pub const SERVER_ERROR: &str = "Server error";

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<vetchat_core::Error> for ServerError {
    fn from(err: vetchat_core::Error) -> Self {
        match err {
            vetchat_core::Error::Validation(message) => ServerError::InvalidRequest(message),
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl From<&ServerError> for StatusCode {
    fn from(err: &ServerError) -> Self {
        match err {
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = StatusCode::from(&self);
        let message = match self {
            ServerError::InvalidRequest(message) => message,
            ServerError::Internal(detail) => {
                tracing::error!(error = %detail, "Request failed");
                SERVER_ERROR.to_string()
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let err = ServerError::from(vetchat_core::Error::Validation(MESSAGE_REQUIRED.into()));
        assert_eq!(StatusCode::from(&err), StatusCode::BAD_REQUEST);

        let err = ServerError::from(vetchat_core::Error::external("geocoder", "timed out"));
        assert_eq!(StatusCode::from(&err), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_internal_detail_hidden() {
        let response = ServerError::Internal("api key leaked".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
