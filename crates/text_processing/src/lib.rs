//! Text Processing for VetChat
//!
//! This crate turns a raw message into the signals the reply composer routes on:
//! - **Topic Classification**: crisis detection and support-topic matching
//! - **Location Extraction**: postal codes and "in <place>" phrases
//!
//! Both components see the same normalized view of the message (see [`normalize`]).
//!
//! # Example
//!
//! ```
//! use vetchat_config::{LocationConfig, TopicCatalogConfig};
//! use vetchat_core::Classifier;
//! use vetchat_text_processing::{normalize, LocationExtractor, TopicClassifier};
//!
//! let catalog = TopicCatalogConfig::default();
//! let classifier = TopicClassifier::new(&catalog).unwrap();
//! let extractor = LocationExtractor::new(&LocationConfig::default(), &catalog).unwrap();
//!
//! let text = normalize("Looking for a shelter in Dallas");
//! assert_eq!(classifier.classify(&text).topics, vec!["housing"]);
//! assert_eq!(extractor.extract(&text).unwrap().text, "dallas");
//! ```

pub mod classifier;
pub mod location;

mod error;

pub use classifier::TopicClassifier;
pub use error::{Result, TextProcessingError};
pub use location::LocationExtractor;

/// Normalize a message for matching
///
/// Lower-cases the text; the classifier and the extractor must both be fed the
/// output of this function.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
}
