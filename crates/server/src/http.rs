//! HTTP Endpoints
//!
//! REST API for VetChat.

use std::time::Duration;

use axum::{
    error_handling::HandleErrorLayer,
    extract::{rejection::JsonRejection, Json, State},
    http::{HeaderValue, Method, StatusCode},
    routing::{get, post},
    BoxError, Router,
};
use serde::{Deserialize, Serialize};
use tower::timeout::{error::Elapsed, TimeoutLayer};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

use vetchat_config::constants::timeouts;

use crate::metrics::metrics_handler;
use crate::state::AppState;
use crate::{ServerError, MESSAGE_REQUIRED};

/// Liveness banner served at `/`
pub const BANNER: &str = "VetChat backend is online 🪖";

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let cors_layer = build_cors_layer(
        &state.config.server.cors_origins,
        state.config.server.cors_enabled,
    );
    let timeout = Duration::from_secs(state.config.server.timeout_seconds);

    Router::new()
        .route("/", get(banner))
        .route("/chat", post(chat))
        // Health check
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        // Prometheus metrics
        .route("/metrics", get(metrics_handler))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .layer(TimeoutLayer::new(timeout)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

/// Request cut off by the server timeout; answered like any internal failure
async fn handle_middleware_error(err: BoxError) -> ServerError {
    if err.is::<Elapsed>() {
        ServerError::Internal("request timed out".to_string())
    } else {
        ServerError::Internal(err.to_string())
    }
}

/// Build CORS layer from configured origins
///
/// - If cors_enabled is false, returns a permissive layer
/// - If no configured origin parses, falls back to permissive with an error log
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::debug!("CORS restrictions disabled, allowing all origins");
        return CorsLayer::permissive();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        tracing::error!("No valid CORS origins configured, allowing all origins");
        return CorsLayer::permissive();
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

/// GET /
async fn banner() -> &'static str {
    BANNER
}

/// Chat request
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

/// Chat response
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// POST /chat
///
/// A missing, null, blank or non-string message (or a body that is not JSON at
/// all) is rejected before the agent sees it.
async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ServerError> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("chat", %request_id);

    async move {
        let message = match payload {
            Ok(Json(request)) => request.message.filter(|m| !m.trim().is_empty()),
            Err(rejection) => {
                tracing::debug!(error = %rejection, "Rejected chat body");
                None
            }
        }
        .ok_or_else(|| ServerError::InvalidRequest(MESSAGE_REQUIRED.to_string()))?;

        let reply = state.agent.reply(&message).await?;
        tracing::info!(route = %reply.route, chars = reply.text.len(), "Chat reply sent");

        Ok(Json(ChatResponse { reply: reply.text }))
    }
    .instrument(span)
    .await
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let topics = state.agent.topic_count();
    let healthy = topics > 0;

    let checks = serde_json::json!({
        "catalog": {
            "status": if healthy { "ok" } else { "empty" },
            "topics": topics
        },
        "metrics": {
            "status": if state.metrics.is_some() { "ok" } else { "disabled" }
        }
    });

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(serde_json::json!({
            "status": if healthy { "healthy" } else { "degraded" },
            "version": env!("CARGO_PKG_VERSION"),
            "environment": format!("{:?}", state.config.environment).to_lowercase(),
            "checks": checks
        })),
    )
}

/// GET /ready
///
/// Probes the generative fallback with a short bound; location lookups are
/// not probed since they are only reached for messages naming a place.
async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let probe = tokio::time::timeout(
        Duration::from_secs(timeouts::READINESS_PROBE_SECS),
        state.agent.is_ready(),
    )
    .await;

    let (ready, fallback_status) = match probe {
        Ok(true) => (true, "ok"),
        Ok(false) => (false, "unreachable"),
        Err(_) => (false, "timeout"),
    };

    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(serde_json::json!({
            "status": if ready { "ready" } else { "not_ready" },
            "checks": {
                "fallback": { "status": fallback_status }
            }
        })),
    )
}
