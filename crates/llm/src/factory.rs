//! Fallback backend factory
//!
//! Picks the backend named by `fallback.provider` and wires in the provider's
//! default endpoint and model where settings leave them unset.

use std::sync::Arc;
use std::time::Duration;

use vetchat_config::{FallbackConfig, FallbackProvider};

use crate::backend::{LlmBackend, LlmConfig, OllamaBackend, OpenAIBackend, OpenAIConfig};
use crate::LlmError;

/// Build the configured fallback backend
pub fn create_backend(config: &FallbackConfig) -> Result<Arc<dyn LlmBackend>, LlmError> {
    let timeout = Duration::from_secs(config.timeout_seconds);

    let backend: Arc<dyn LlmBackend> = match config.provider {
        FallbackProvider::OpenAi => Arc::new(OpenAIBackend::new(OpenAIConfig {
            endpoint: config.endpoint().to_string(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            model: config.model().to_string(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout,
        })?),
        FallbackProvider::Ollama => Arc::new(OllamaBackend::new(LlmConfig {
            model: config.model().to_string(),
            endpoint: config.endpoint().to_string(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout,
            ..Default::default()
        })?),
    };

    tracing::info!(
        provider = ?config.provider,
        model = backend.model_name(),
        endpoint = config.endpoint(),
        "Created fallback backend"
    );

    Ok(backend)
}
