//! Configuration management for VetChat
//!
//! Supports loading configuration from:
//! - YAML/TOML files (`config/default.*`, `config/{env}.*`)
//! - Environment variables (`VETCHAT__` prefix)
//! - Conventional platform variables (`PORT`, `OPENAI_API_KEY`, `VA_API_KEY`)
//!
//! # Topic Catalog
//!
//! The support-topic catalog (patterns and canned replies) is built in, and can
//! be replaced by a YAML file referenced from `catalog_path`.

pub mod catalog;
pub mod constants;
pub mod settings;

pub use catalog::{TopicCatalogConfig, TopicDefinition, CRISIS_TOPIC_ID};
pub use settings::{
    load_settings, FacilitiesConfig, FallbackConfig, FallbackProvider, GeocodingConfig,
    LocationConfig, ObservabilityConfig, RoutingConfig, RuntimeEnvironment, ServerConfig,
    Settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
