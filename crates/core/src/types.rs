//! Request-scoped domain types
//!
//! Everything here is built fresh per message and dropped once the reply is sent.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the topic that overrides every other route
pub const CRISIS_TOPIC: &str = "crisis";

/// Phone sentinel for facilities without a listed number
pub const NO_PHONE: &str = "N/A";

/// Outcome of topic classification
///
/// When `crisis` is set, `topics` is always empty: no other topic is evaluated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationResult {
    /// Matched non-crisis topic ids, in catalog order
    pub topics: Vec<String>,
    /// Whether a crisis pattern matched
    pub crisis: bool,
}

impl ClassificationResult {
    pub fn crisis() -> Self {
        Self {
            topics: Vec::new(),
            crisis: true,
        }
    }

    pub fn with_topics(topics: Vec<String>) -> Self {
        Self {
            topics,
            crisis: false,
        }
    }

    /// No crisis and no topic: the message goes to the fallback
    pub fn is_empty(&self) -> bool {
        !self.crisis && self.topics.is_empty()
    }
}

/// How a location was found in the message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    PostalCode,
    PlaceName,
}

/// Location text extracted from a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationQuery {
    pub text: String,
    pub kind: LocationKind,
}

impl LocationQuery {
    pub fn postal_code(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: LocationKind::PostalCode,
        }
    }

    pub fn place_name(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: LocationKind::PlaceName,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Best geocoding match for a location query (WGS-84 degrees)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoResult {
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: String,
}

/// A physical support resource near a resolved location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facility {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl Facility {
    /// Phone number, or `"N/A"` when the directory lists none
    pub fn phone_or_default(&self) -> &str {
        self.phone
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(NO_PHONE)
    }

    /// Informational link, or `fallback` when the directory lists none
    pub fn url_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(fallback)
    }
}

/// Which branch of the decision order produced a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyRoute {
    Location,
    Crisis,
    Topics,
    Fallback,
}

impl ReplyRoute {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Location => "location",
            Self::Crisis => "crisis",
            Self::Topics => "topics",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for ReplyRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composed reply; only `text` is sent to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub route: ReplyRoute,
}

impl Reply {
    pub fn new(text: impl Into<String>, route: ReplyRoute) -> Self {
        Self {
            text: text.into(),
            route,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_constructors() {
        let crisis = ClassificationResult::crisis();
        assert!(crisis.crisis);
        assert!(crisis.topics.is_empty());
        assert!(!crisis.is_empty());

        assert!(ClassificationResult::default().is_empty());
        assert!(!ClassificationResult::with_topics(vec!["housing".into()]).is_empty());
    }

    #[test]
    fn test_facility_defaults() {
        let facility = Facility {
            name: "Dallas VA Medical Center".into(),
            phone: None,
            url: Some("  ".into()),
        };
        assert_eq!(facility.phone_or_default(), "N/A");
        assert_eq!(
            facility.url_or("https://www.va.gov/find-locations/"),
            "https://www.va.gov/find-locations/"
        );
    }

    #[test]
    fn test_facility_deserialize_missing_fields() {
        let facility: Facility = serde_json::from_str(r#"{"name":"Vet Center"}"#).unwrap();
        assert!(facility.phone.is_none());
        assert!(facility.url.is_none());
    }

    #[test]
    fn test_location_query_display() {
        let query = LocationQuery::postal_code("75201");
        assert_eq!(query.to_string(), "75201");
        assert_eq!(query.kind, LocationKind::PostalCode);
        assert_eq!(LocationQuery::place_name("dallas").kind, LocationKind::PlaceName);
    }
}
