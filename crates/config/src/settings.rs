//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::{endpoints, facilities, fallback, timeouts, DEFAULT_PORT, USER_AGENT};
use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation, warnings only
    #[default]
    Development,
    /// Staging mode - stricter validation
    Staging,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if strict validation should be applied
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Generative fallback backend
    #[serde(default)]
    pub fallback: FallbackConfig,

    /// Geocoding collaborator
    #[serde(default)]
    pub geocoding: GeocodingConfig,

    /// Facility-directory collaborator
    #[serde(default)]
    pub facilities: FacilitiesConfig,

    /// Location extraction tuning
    #[serde(default)]
    pub location: LocationConfig,

    /// Reply routing policy
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Optional YAML topic catalog; built-in catalog when unset
    #[serde(default)]
    pub catalog_path: Option<String>,
}

impl Settings {
    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_fallback()?;
        self.validate_lookups()?;
        self.validate_request_budget()?;
        Ok(())
    }

    /// The request timeout must outlast the slowest reply route, so that a
    /// slow collaborator fails as a collaborator error rather than a cut-off
    fn validate_request_budget(&self) -> Result<(), ConfigError> {
        let location = self
            .geocoding
            .timeout_seconds
            .saturating_add(self.facilities.timeout_seconds);
        let slowest = location.max(self.fallback.timeout_seconds);

        if self.server.timeout_seconds <= slowest {
            return Err(ConfigError::InvalidValue {
                field: "server.timeout_seconds".to_string(),
                message: format!(
                    "Must exceed the slowest reply route ({}s), got {}s",
                    slowest, self.server.timeout_seconds
                ),
            });
        }

        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if self.server.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.timeout_seconds".to_string(),
                message: "Timeout must be at least 1 second".to_string(),
            });
        }

        if self.environment.is_production()
            && self.server.cors_enabled
            && self.server.cors_origins.is_empty()
        {
            tracing::warn!(
                "CORS is enabled in production but no origins are configured. \
                 This may block legitimate requests."
            );
        }

        Ok(())
    }

    fn validate_fallback(&self) -> Result<(), ConfigError> {
        let fallback = &self.fallback;

        if fallback.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "fallback.timeout_seconds".to_string(),
                message: "Timeout must be at least 1 second".to_string(),
            });
        }

        if !(0.0..=2.0).contains(&fallback.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "fallback.temperature".to_string(),
                message: format!("Must be between 0.0 and 2.0, got {}", fallback.temperature),
            });
        }

        if fallback.provider == FallbackProvider::OpenAi && fallback.api_key.is_none() {
            if self.environment.is_strict() {
                return Err(ConfigError::MissingField("fallback.api_key".to_string()));
            }
            tracing::warn!("fallback.api_key not set; generative fallback replies will fail");
        }

        Ok(())
    }

    fn validate_lookups(&self) -> Result<(), ConfigError> {
        if self.geocoding.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "geocoding.timeout_seconds".to_string(),
                message: "Timeout must be at least 1 second".to_string(),
            });
        }

        if self.geocoding.user_agent.trim().is_empty() {
            return Err(ConfigError::MissingField("geocoding.user_agent".to_string()));
        }

        let facilities = &self.facilities;
        if facilities.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "facilities.timeout_seconds".to_string(),
                message: "Timeout must be at least 1 second".to_string(),
            });
        }

        if facilities.radius_miles == 0 {
            return Err(ConfigError::InvalidValue {
                field: "facilities.radius_miles".to_string(),
                message: "Radius must be at least 1 mile".to_string(),
            });
        }

        if facilities.max_results == 0 || facilities.max_results > facilities::MAX_RESULTS {
            return Err(ConfigError::InvalidValue {
                field: "facilities.max_results".to_string(),
                message: format!(
                    "Must be between 1 and {}, got {}",
                    facilities::MAX_RESULTS,
                    facilities.max_results
                ),
            });
        }

        if facilities.api_key.is_none() {
            tracing::warn!("facilities.api_key not set; facility lookups will be rejected");
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub timeout_seconds: u64,

    /// Enable CORS restrictions (false = permissive)
    #[serde(default)]
    pub cors_enabled: bool,

    /// CORS allowed origins
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_request_timeout() -> u64 {
    30
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_seconds: default_request_timeout(),
            // Permissive until origins are configured
            cors_enabled: false,
            cors_origins: Vec::new(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,

    /// Enable Prometheus metrics at /metrics
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

/// Generative fallback provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FallbackProvider {
    /// OpenAI-compatible chat completions
    #[default]
    OpenAi,
    /// Local Ollama server
    Ollama,
}

/// Generative fallback configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    #[serde(default)]
    pub provider: FallbackProvider,

    /// API endpoint; provider default when unset
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Model name; provider default when unset
    #[serde(default)]
    pub model: Option<String>,

    /// API key (also read from OPENAI_API_KEY)
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_fallback_timeout")]
    pub timeout_seconds: u64,
}

fn default_max_tokens() -> usize {
    fallback::MAX_TOKENS
}
fn default_temperature() -> f32 {
    fallback::TEMPERATURE
}
fn default_fallback_timeout() -> u64 {
    timeouts::FALLBACK_SECS
}

impl FallbackConfig {
    /// Endpoint to call, falling back to the provider default
    pub fn endpoint(&self) -> &str {
        match (&self.endpoint, self.provider) {
            (Some(endpoint), _) => endpoint,
            (None, FallbackProvider::OpenAi) => endpoints::OPENAI_DEFAULT,
            (None, FallbackProvider::Ollama) => endpoints::OLLAMA_DEFAULT,
        }
    }

    /// Model to request, falling back to the provider default
    pub fn model(&self) -> &str {
        match (&self.model, self.provider) {
            (Some(model), _) => model,
            (None, FallbackProvider::OpenAi) => fallback::OPENAI_MODEL,
            (None, FallbackProvider::Ollama) => fallback::OLLAMA_MODEL,
        }
    }
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            provider: FallbackProvider::default(),
            endpoint: None,
            model: None,
            api_key: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_seconds: default_fallback_timeout(),
        }
    }
}

/// Geocoding collaborator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    #[serde(default = "default_geocoding_endpoint")]
    pub endpoint: String,

    /// Nominatim's usage policy requires an identifying User-Agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// ISO country codes to restrict matches to (comma separated)
    #[serde(default = "default_country_codes")]
    pub country_codes: Option<String>,

    #[serde(default = "default_lookup_timeout")]
    pub timeout_seconds: u64,
}

fn default_geocoding_endpoint() -> String {
    endpoints::NOMINATIM_DEFAULT.to_string()
}
fn default_user_agent() -> String {
    USER_AGENT.to_string()
}
fn default_country_codes() -> Option<String> {
    Some("us".to_string())
}
fn default_lookup_timeout() -> u64 {
    timeouts::LOOKUP_SECS
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            endpoint: default_geocoding_endpoint(),
            user_agent: default_user_agent(),
            country_codes: default_country_codes(),
            timeout_seconds: default_lookup_timeout(),
        }
    }
}

/// Facility-directory collaborator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilitiesConfig {
    #[serde(default = "default_facilities_endpoint")]
    pub endpoint: String,

    /// API key (also read from VA_API_KEY)
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_radius")]
    pub radius_miles: u32,

    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Link used when a facility has no website, and in "none nearby" replies
    #[serde(default = "default_fallback_url")]
    pub fallback_url: String,

    #[serde(default = "default_lookup_timeout")]
    pub timeout_seconds: u64,
}

fn default_facilities_endpoint() -> String {
    endpoints::VA_FACILITIES_DEFAULT.to_string()
}
fn default_radius() -> u32 {
    facilities::RADIUS_MILES
}
fn default_max_results() -> usize {
    facilities::MAX_RESULTS
}
fn default_fallback_url() -> String {
    facilities::FALLBACK_URL.to_string()
}

impl Default for FacilitiesConfig {
    fn default() -> Self {
        Self {
            endpoint: default_facilities_endpoint(),
            api_key: None,
            radius_miles: default_radius(),
            max_results: default_max_results(),
            fallback_url: default_fallback_url(),
            timeout_seconds: default_lookup_timeout(),
        }
    }
}

/// Location extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Words that cannot start a place name ("in need", "in touch", "in the army")
    ///
    /// Candidates matching a topic-catalog pattern are rejected as well.
    #[serde(default = "default_non_place_words")]
    pub non_place_words: Vec<String>,

    /// Longest place name accepted, in words
    #[serde(default = "default_max_place_words")]
    pub max_place_words: usize,
}

fn default_non_place_words() -> Vec<String> {
    [
        // determiners and pronouns
        "a", "an", "my", "our", "your", "his", "her", "their", "this", "that", "these",
        "those", "it", "me", "us", "them", "any", "some", "all", "what", "which",
        // common non-place phrases
        "need", "trouble", "touch", "general", "order", "fact", "addition", "case",
        "danger", "pain", "debt", "time", "person", "line", "charge", "front", "advance",
        "mind", "terms", "regards", "between", "getting", "finding", "looking", "applying",
        "recovery", "treatment", "therapy", "school", "college", "jail", "prison",
        "area", "past", "future", "meantime", "morning", "evening", "process", "middle",
        "service", "military", "hospital", "filing", "served", "serving",
        // service branches
        "army", "navy", "marines", "marine", "corps", "air", "coast", "guard", "reserve",
        "reserves", "va", "veterans", "veteran",
        // topic vocabulary
        "crisis", "help", "housing", "shelter", "jobs", "job", "work", "employment",
        "benefits", "benefit", "claims", "rehab", "detox", "care",
    ]
    .iter()
    .map(|w| w.to_string())
    .collect()
}

fn default_max_place_words() -> usize {
    4
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            non_place_words: default_non_place_words(),
            max_place_words: default_max_place_words(),
        }
    }
}

/// Reply routing policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Check for crisis language before resolving locations.
    ///
    /// When false, a message with a location goes to the locator even if it
    /// also contains crisis language.
    #[serde(default = "default_true")]
    pub crisis_first: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self { crisis_first: true }
    }
}

/// Load settings from files and environment
///
/// Priority (highest to lowest):
/// 1. `PORT`, `OPENAI_API_KEY`, `VA_API_KEY`
/// 2. Environment variables (`VETCHAT__` prefix, `__` separator)
/// 3. config/{env}.yaml (if env specified)
/// 4. config/default.yaml
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("VETCHAT")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let mut settings: Settings = config.try_deserialize()?;

    apply_conventional_env(&mut settings, |key| std::env::var(key).ok())?;

    settings.validate()?;

    Ok(settings)
}

/// Apply the conventional unprefixed variables used by hosting platforms
fn apply_conventional_env<F>(settings: &mut Settings, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = lookup("PORT") {
        settings.server.port = port.trim().parse().map_err(|_| ConfigError::InvalidValue {
            field: "PORT".to_string(),
            message: format!("Not a valid port: {}", port),
        })?;
    }

    if let Some(key) = lookup("OPENAI_API_KEY").filter(|k| !k.is_empty()) {
        settings.fallback.api_key = Some(key);
    }

    if let Some(key) = lookup("VA_API_KEY").filter(|k| !k.is_empty()) {
        settings.facilities.api_key = Some(key);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 10000);
        assert_eq!(settings.facilities.radius_miles, 50);
        assert_eq!(settings.facilities.max_results, 5);
        assert!(settings.routing.crisis_first);
        assert_eq!(settings.fallback.model(), "gpt-3.5-turbo");
    }

    #[test]
    fn test_default_settings_validate_in_development() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_production_requires_fallback_key() {
        let mut settings = Settings::default();
        settings.environment = RuntimeEnvironment::Production;
        assert!(settings.validate_fallback().is_err());

        settings.fallback.api_key = Some("sk-test".to_string());
        assert!(settings.validate_fallback().is_ok());

        settings.fallback.api_key = None;
        settings.fallback.provider = FallbackProvider::Ollama;
        assert!(settings.validate_fallback().is_ok());
    }

    #[test]
    fn test_server_validation() {
        let mut settings = Settings::default();

        settings.server.port = 0;
        assert!(settings.validate_server().is_err());
        settings.server.port = 8080;

        settings.server.timeout_seconds = 0;
        assert!(settings.validate_server().is_err());
        settings.server.timeout_seconds = 30;

        assert!(settings.validate_server().is_ok());
    }

    #[test]
    fn test_request_budget_validation() {
        let mut settings = Settings::default();
        assert!(settings.validate_request_budget().is_ok());

        settings.server.timeout_seconds = 10;
        assert!(settings.validate_request_budget().is_err());
        assert!(settings.validate().is_err());

        // location lookups (5s + 5s) now bound the budget
        settings.fallback.timeout_seconds = 5;
        assert!(settings.validate_request_budget().is_err());
        settings.server.timeout_seconds = 11;
        assert!(settings.validate_request_budget().is_ok());

        settings.geocoding.timeout_seconds = 6;
        assert!(settings.validate_request_budget().is_err());
    }

    #[test]
    fn test_lookup_validation() {
        let mut settings = Settings::default();

        settings.facilities.max_results = 0;
        assert!(settings.validate_lookups().is_err());
        settings.facilities.max_results = 6;
        assert!(settings.validate_lookups().is_err());
        settings.facilities.max_results = 3;
        assert!(settings.validate_lookups().is_ok());

        settings.facilities.radius_miles = 0;
        assert!(settings.validate_lookups().is_err());
        settings.facilities.radius_miles = 50;

        settings.geocoding.timeout_seconds = 0;
        assert!(settings.validate_lookups().is_err());
    }

    #[test]
    fn test_fallback_temperature_bounds() {
        let mut settings = Settings::default();
        settings.fallback.temperature = 2.5;
        assert!(settings.validate_fallback().is_err());
        settings.fallback.temperature = 0.0;
        assert!(settings.validate_fallback().is_ok());
    }

    #[test]
    fn test_provider_defaults() {
        let mut config = FallbackConfig {
            provider: FallbackProvider::Ollama,
            ..Default::default()
        };
        assert_eq!(config.endpoint(), "http://localhost:11434");
        assert_eq!(config.model(), "llama3.2:3b");

        config.model = Some("qwen2.5:7b".to_string());
        assert_eq!(config.model(), "qwen2.5:7b");
    }

    #[test]
    fn test_conventional_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("PORT", "3000"),
            ("OPENAI_API_KEY", "sk-env"),
            ("VA_API_KEY", "va-env"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        apply_conventional_env(&mut settings, |k| vars.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.fallback.api_key.as_deref(), Some("sk-env"));
        assert_eq!(settings.facilities.api_key.as_deref(), Some("va-env"));
    }

    #[test]
    fn test_invalid_port_env() {
        let mut settings = Settings::default();
        let result = apply_conventional_env(&mut settings, |k| {
            (k == "PORT").then(|| "not-a-port".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_provider_deserialize() {
        let provider: FallbackProvider = serde_yaml::from_str("openai").unwrap();
        assert_eq!(provider, FallbackProvider::OpenAi);
        let provider: FallbackProvider = serde_yaml::from_str("ollama").unwrap();
        assert_eq!(provider, FallbackProvider::Ollama);
    }
}
