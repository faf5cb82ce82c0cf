//! Topic Classification
//!
//! Regex classifier over the topic catalog. Crisis patterns are checked first
//! and short-circuit everything else; otherwise every non-crisis topic whose
//! patterns match is reported, in catalog order.

use regex::{Regex, RegexBuilder};

use vetchat_config::TopicCatalogConfig;
use vetchat_core::{ClassificationResult, Classifier, CRISIS_TOPIC};

use crate::error::{Result, TextProcessingError};

/// Topic with its patterns compiled
struct CompiledTopic {
    id: String,
    patterns: Vec<Regex>,
    reply: String,
}

impl CompiledTopic {
    fn compile(id: &str, patterns: &[String], reply: &str) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                RegexBuilder::new(p)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| TextProcessingError::InvalidPattern {
                        topic: id.to_string(),
                        message: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            id: id.to_string(),
            patterns,
            reply: reply.to_string(),
        })
    }

    /// Any-match: pattern order is irrelevant
    fn matches(&self, text: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(text))
    }
}

/// Pattern-matching topic classifier
///
/// Immutable once built; share it behind an `Arc`.
pub struct TopicClassifier {
    crisis: CompiledTopic,
    topics: Vec<CompiledTopic>,
}

impl TopicClassifier {
    /// Compile a validated catalog
    pub fn new(catalog: &TopicCatalogConfig) -> Result<Self> {
        catalog.validate()?;

        let mut crisis = None;
        let mut topics = Vec::with_capacity(catalog.topics.len().saturating_sub(1));

        for topic in &catalog.topics {
            let compiled = CompiledTopic::compile(&topic.id, &topic.patterns, &topic.reply)?;
            if topic.id == CRISIS_TOPIC {
                crisis = Some(compiled);
            } else {
                topics.push(compiled);
            }
        }

        let crisis = crisis.ok_or_else(|| {
            TextProcessingError::InvalidCatalog(format!("missing '{}' topic", CRISIS_TOPIC))
        })?;

        tracing::debug!(
            topics = topics.len() + 1,
            patterns = crisis.patterns.len()
                + topics.iter().map(|t| t.patterns.len()).sum::<usize>(),
            "Compiled topic catalog"
        );

        Ok(Self { crisis, topics })
    }

    /// Non-crisis topic ids in catalog order
    pub fn topic_ids(&self) -> impl Iterator<Item = &str> {
        self.topics.iter().map(|t| t.id.as_str())
    }
}

impl Classifier for TopicClassifier {
    fn classify(&self, text: &str) -> ClassificationResult {
        if self.crisis.matches(text) {
            return ClassificationResult::crisis();
        }

        let matched = self
            .topics
            .iter()
            .filter(|topic| topic.matches(text))
            .map(|topic| topic.id.clone())
            .collect();

        ClassificationResult::with_topics(matched)
    }

    fn reply_for(&self, topic: &str) -> Option<&str> {
        if topic == CRISIS_TOPIC {
            return Some(&self.crisis.reply);
        }
        self.topics
            .iter()
            .find(|t| t.id == topic)
            .map(|t| t.reply.as_str())
    }

    fn crisis_reply(&self) -> &str {
        &self.crisis.reply
    }

    fn topic_count(&self) -> usize {
        self.topics.len() + 1
    }

    fn name(&self) -> &str {
        "regex"
    }
}
