//! Centralized constants for VetChat
//!
//! Single source of truth for endpoints, limits and fallback text used across
//! the crates. Settings defaults are built from these.

/// External service endpoints
pub mod endpoints {
    /// OpenAI API endpoint
    pub const OPENAI_DEFAULT: &str = "https://api.openai.com/v1";

    /// Ollama LLM endpoint
    pub const OLLAMA_DEFAULT: &str = "http://localhost:11434";

    /// OpenStreetMap Nominatim geocoder
    pub const NOMINATIM_DEFAULT: &str = "https://nominatim.openstreetmap.org";

    /// VA Lighthouse Facilities API
    pub const VA_FACILITIES_DEFAULT: &str = "https://api.va.gov/services/va_facilities/v1";
}

/// Facility search limits
pub mod facilities {
    /// Search radius around the geocoded point (miles)
    pub const RADIUS_MILES: u32 = 50;

    /// Maximum facilities listed in a reply
    pub const MAX_RESULTS: usize = 5;

    /// Generic resource page for facilities without a website
    pub const FALLBACK_URL: &str = "https://www.va.gov/find-locations/";
}

/// Timeouts (seconds)
pub mod timeouts {
    /// Geocoding and facility lookups
    pub const LOOKUP_SECS: u64 = 5;

    /// Generative fallback completion
    pub const FALLBACK_SECS: u64 = 20;

    /// Readiness probe of the fallback backend
    pub const READINESS_PROBE_SECS: u64 = 2;
}

/// Fallback model defaults
pub mod fallback {
    pub const OPENAI_MODEL: &str = "gpt-3.5-turbo";
    pub const OLLAMA_MODEL: &str = "llama3.2:3b";
    pub const MAX_TOKENS: usize = 512;
    pub const TEMPERATURE: f32 = 0.7;
}

/// Default HTTP port (matches the hosting platform's default)
pub const DEFAULT_PORT: u16 = 10000;

/// User-Agent sent to public APIs that require one
pub const USER_AGENT: &str = concat!("vetchat-backend/", env!("CARGO_PKG_VERSION"));
