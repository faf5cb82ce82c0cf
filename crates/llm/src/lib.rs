//! Generative Fallback for VetChat
//!
//! Messages that match no location, crisis phrase or support topic are answered
//! by a chat-completion model. Features:
//! - OpenAI-compatible chat completions (default, `gpt-3.5-turbo`)
//! - Local Ollama models
//! - One request per message: no retries, bounded by the client timeout

pub mod backend;
pub mod factory;
pub mod prompt;

pub use backend::{
    FinishReason, GenerationResult, LlmBackend, LlmConfig, OllamaBackend, OpenAIBackend,
    OpenAIConfig,
};
pub use factory::create_backend;
pub use prompt::{Message, Role};

use thiserror::Error;

/// Service name reported for fallback failures
pub const SERVICE_NAME: &str = "fallback";

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for vetchat_core::Error {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Configuration(message) => vetchat_core::Error::Configuration(message),
            other => vetchat_core::Error::external(SERVICE_NAME, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let err: vetchat_core::Error = LlmError::Timeout.into();
        assert_eq!(err.service(), Some("fallback"));
        assert!(!err.is_client_error());

        let err: vetchat_core::Error = LlmError::Configuration("bad".to_string()).into();
        assert!(matches!(err, vetchat_core::Error::Configuration(_)));
    }
}
