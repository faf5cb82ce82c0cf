//! Topic Catalog Configuration
//!
//! Defines the support topics the classifier knows about: each topic has an
//! id, a set of trigger patterns and a canned reply. The catalog can be
//! loaded from a YAML file; the built-in catalog is used otherwise.
//!
//! ```yaml
//! topics:
//!   - id: crisis
//!     patterns: ['\bsuicid(e|al)\b']
//!     reply: "Dial 988 then press 1."
//!   - id: housing
//!     patterns: ['\bshelter\b']
//!     reply: "Housing support ..."
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::ConfigError;

/// Id of the topic evaluated before all others
pub const CRISIS_TOPIC_ID: &str = "crisis";

/// Single topic definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicDefinition {
    /// Topic identifier
    pub id: String,
    /// Trigger patterns (regular expressions, matched case-insensitively)
    pub patterns: Vec<String>,
    /// Canned reply sent when the topic matches
    pub reply: String,
}

impl TopicDefinition {
    pub fn is_crisis(&self) -> bool {
        self.id == CRISIS_TOPIC_ID
    }
}

/// Ordered topic catalog; order is the order replies are concatenated in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicCatalogConfig {
    pub topics: Vec<TopicDefinition>,
}

impl TopicCatalogConfig {
    /// Load a catalog from a YAML file and validate it
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileNotFound(format!("{}: {}", path.display(), e)))?;
        let catalog = Self::from_yaml(&content)?;
        tracing::info!(
            path = %path.display(),
            topics = catalog.topics.len(),
            "Loaded topic catalog"
        );
        Ok(catalog)
    }

    /// Parse and validate a catalog from YAML text
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let catalog: Self =
            serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Check catalog invariants
    ///
    /// Exactly one crisis topic, unique ids, and no topic without patterns or reply.
    /// Pattern syntax is checked when the classifier compiles the catalog.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.topics.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "topics".to_string(),
                message: "Catalog must define at least one topic".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for topic in &self.topics {
            if topic.id.trim().is_empty() {
                return Err(ConfigError::MissingField("topics[].id".to_string()));
            }
            if !seen.insert(topic.id.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: format!("topics.{}", topic.id),
                    message: "Duplicate topic id".to_string(),
                });
            }
            if topic.patterns.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("topics.{}.patterns", topic.id),
                    message: "Topic needs at least one pattern".to_string(),
                });
            }
            if topic.reply.trim().is_empty() {
                return Err(ConfigError::MissingField(format!("topics.{}.reply", topic.id)));
            }
        }

        let crisis_count = self.topics.iter().filter(|t| t.is_crisis()).count();
        if crisis_count != 1 {
            return Err(ConfigError::InvalidValue {
                field: "topics".to_string(),
                message: format!(
                    "Catalog must define exactly one '{}' topic, found {}",
                    CRISIS_TOPIC_ID, crisis_count
                ),
            });
        }

        Ok(())
    }

    /// Every pattern in the catalog, crisis included, in catalog order
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.topics
            .iter()
            .flat_map(|t| t.patterns.iter().map(String::as_str))
    }

    pub fn topic_ids(&self) -> Vec<&str> {
        self.topics.iter().map(|t| t.id.as_str()).collect()
    }
}

impl Default for TopicCatalogConfig {
    fn default() -> Self {
        Self {
            topics: vec![
                topic(
                    CRISIS_TOPIC_ID,
                    &[
                        r"\bsuicid(e|al)\b",
                        r"\bkill(ing)?\s+my\s?self\b",
                        r"\bend(ing)?\s+(it\s+all|my\s+life)\b",
                        r"\bwant\s+to\s+die\b",
                        r"\bself[-\s]?harm\b",
                        r"\bhurt(ing)?\s+my\s?self\b",
                        r"\bno\s+reason\s+to\s+live\b",
                    ],
                    "🚨 **You are not alone.** If you are in crisis or thinking about hurting yourself, \
                     contact the Veterans Crisis Line right now:\n\
                     📞 Dial 988 then press 1\n\
                     💬 Text 838255\n\
                     🌐 Chat at https://www.veteranscrisisline.net\n\
                     If you are in immediate danger, call 911.",
                ),
                topic(
                    "substance",
                    &[
                        r"\b(alcohol|alcoholic|drinking\s+problem)\b",
                        r"\b(drugs?|opioids?|heroin|meth|fentanyl)\b",
                        r"\b(addict(ed|ion)?|substance\s+(use|abuse))\b",
                        r"\b(rehab|detox|sober|sobriety|relapsed?)\b",
                    ],
                    "💊 **Substance use support:** VA offers confidential treatment for alcohol and drug use. \
                     Learn more at https://www.va.gov/health-care/health-needs-conditions/substance-use-problems/ \
                     or call the SAMHSA helpline at 1-800-662-4357 (24/7).",
                ),
                topic(
                    "housing",
                    &[
                        r"\bhousing\b",
                        r"\bhomeless(ness)?\b",
                        r"\bshelter\b",
                        r"\bevict(ed|ion)?\b",
                        r"\bplace\s+to\s+(live|stay|sleep)\b",
                    ],
                    "🏠 You can reach Veterans Housing Support at https://www.va.gov/homeless \
                     or call 1-877-424-3838.",
                ),
                topic(
                    "benefits",
                    &[
                        r"\bbenefits?\b",
                        r"\bdisability\s+(claim|rating|compensation)\b",
                        r"\bclaims?\b",
                        r"\bpension\b",
                        r"\bgi\s+bill\b",
                    ],
                    "📄 **VA benefits:** Check eligibility, file a claim or track one at \
                     https://www.va.gov/benefits/ or call 1-800-827-1000.",
                ),
                topic(
                    "jobs",
                    &[
                        r"\bjobs?\b",
                        r"\bemployment\b",
                        r"\bunemploy(ed|ment)\b",
                        r"\bcareers?\b",
                        r"\bhiring\b",
                        r"\bresume\b",
                    ],
                    "💼 **Employment help:** Find career counseling, job listings and VR&E support at \
                     https://www.va.gov/careers-employment/.",
                ),
            ],
        }
    }
}

fn topic(id: &str, patterns: &[&str], reply: &str) -> TopicDefinition {
    TopicDefinition {
        id: id.to_string(),
        patterns: patterns.iter().map(|p| p.to_string()).collect(),
        reply: reply.to_string(),
    }
}
