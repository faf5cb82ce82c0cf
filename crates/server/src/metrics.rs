//! Prometheus metrics
//!
//! Counters and histograms are recorded where the work happens (reply routes in
//! the agent, external calls in the resolver and fallback); this module installs
//! the recorder and serves the exposition.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::state::AppState;

/// Install the global Prometheus recorder
///
/// Returns `None` when a recorder is already installed.
pub fn init_metrics() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            describe_metrics();
            Some(handle)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to install Prometheus recorder");
            None
        }
    }
}

fn describe_metrics() {
    ::metrics::describe_counter!("vetchat_replies_total", "Replies sent, by route");
    ::metrics::describe_histogram!(
        "vetchat_external_call_seconds",
        ::metrics::Unit::Seconds,
        "Latency of geocoding, facility and fallback calls"
    );
    ::metrics::describe_counter!(
        "vetchat_external_errors_total",
        "Failed geocoding, facility and fallback calls"
    );
}

/// GET /metrics
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics {
        Some(ref handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        ),
        None => (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "text/plain")],
            "metrics disabled".to_string(),
        ),
    }
}
