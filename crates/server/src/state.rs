//! Application State
//!
//! Shared state across all handlers. Everything is read-only after startup.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use vetchat_agent::Agent;
use vetchat_config::Settings;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    /// Reply agent behind `POST /chat`
    pub agent: Arc<dyn Agent>,
    /// Prometheus handle; `None` when metrics are disabled
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: Settings, agent: Arc<dyn Agent>) -> Self {
        Self {
            config: Arc::new(config),
            agent,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
