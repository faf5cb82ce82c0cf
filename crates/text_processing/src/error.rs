//! Error types for text processing

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TextProcessingError {
    #[error("Invalid pattern for topic '{topic}': {message}")]
    InvalidPattern { topic: String, message: String },

    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),
}

pub type Result<T> = std::result::Result<T, TextProcessingError>;

impl From<TextProcessingError> for vetchat_core::Error {
    fn from(err: TextProcessingError) -> Self {
        vetchat_core::Error::Configuration(err.to_string())
    }
}

impl From<vetchat_config::ConfigError> for TextProcessingError {
    fn from(err: vetchat_config::ConfigError) -> Self {
        TextProcessingError::InvalidCatalog(err.to_string())
    }
}
