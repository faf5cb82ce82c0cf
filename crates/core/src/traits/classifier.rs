//! Topic classification capability

use crate::types::ClassificationResult;

/// Classifies a message into support topics
///
/// The regex classifier is one implementation; anything smarter can replace it
/// as long as it keeps the crisis contract: when `crisis` is reported, no other
/// topic is.
pub trait Classifier: Send + Sync {
    /// Classify already-normalized text
    fn classify(&self, text: &str) -> ClassificationResult;

    /// Reply template for a topic id
    fn reply_for(&self, topic: &str) -> Option<&str>;

    /// Reply template for the crisis topic
    fn crisis_reply(&self) -> &str;

    /// Number of topics known to this classifier
    fn topic_count(&self) -> usize;

    /// Classifier name (for logging)
    fn name(&self) -> &str;
}
