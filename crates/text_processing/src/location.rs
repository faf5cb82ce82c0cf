//! Location Extraction
//!
//! Finds the location a message refers to: a 5-digit postal code, or a place
//! named after the word "in" ("any clinics in san antonio?"). Postal codes win
//! when both are present.
//!
//! A place candidate is rejected when it starts with a configured non-place
//! word or when any topic-catalog pattern matches it, so "interested in the gi
//! bill" is a benefits question rather than a town.

use once_cell::sync::Lazy;
use regex::{Regex, RegexSet, RegexSetBuilder};
use std::collections::HashSet;

use vetchat_config::{LocationConfig, TopicCatalogConfig};
use vetchat_core::LocationQuery;

use crate::error::{Result, TextProcessingError};

static POSTAL_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[0-9]{5}\b").expect("postal code pattern is valid"));

/// Marker word introducing a place name
static IN_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bin\s+").expect("marker pattern is valid"));

/// Letters and spaces after the marker, up to a terminator or end of text
static PLACE_TAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^([a-z][a-z\s]*?)\s*(?:[.,;!?]|$)").expect("place pattern is valid")
});

/// Extracts location queries from normalized text
pub struct LocationExtractor {
    non_place_words: HashSet<String>,
    topic_vocabulary: RegexSet,
    max_place_words: usize,
}

impl LocationExtractor {
    /// Build an extractor that treats the catalog's vocabulary as non-places
    pub fn new(config: &LocationConfig, catalog: &TopicCatalogConfig) -> Result<Self> {
        let topic_vocabulary = RegexSetBuilder::new(catalog.patterns())
            .case_insensitive(true)
            .build()
            .map_err(|e| TextProcessingError::InvalidCatalog(e.to_string()))?;

        Ok(Self {
            non_place_words: config
                .non_place_words
                .iter()
                .map(|w| w.trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
            topic_vocabulary,
            max_place_words: config.max_place_words.max(1),
        })
    }

    /// Extract the location a message refers to, if any
    pub fn extract(&self, text: &str) -> Option<LocationQuery> {
        if let Some(m) = POSTAL_CODE.find(text) {
            return Some(LocationQuery::postal_code(m.as_str()));
        }

        self.extract_place(text).map(LocationQuery::place_name)
    }

    /// First acceptable "in <place>" candidate
    ///
    /// Every occurrence of "in" is tried, so "in need of a shelter in dallas"
    /// still finds "dallas" after rejecting "need of a shelter in dallas".
    fn extract_place(&self, text: &str) -> Option<String> {
        IN_MARKER.find_iter(text).find_map(|marker| {
            let caps = PLACE_TAIL.captures(&text[marker.end()..])?;
            let candidate = caps.get(1)?.as_str().trim();
            self.accept(candidate).then(|| candidate.to_string())
        })
    }

    fn accept(&self, candidate: &str) -> bool {
        let words: Vec<&str> = candidate.split_whitespace().collect();
        if words.is_empty() || words.len() > self.max_place_words {
            return false;
        }

        // "in the bronx" is a place; judge it by the word after the article
        let first = match words.as_slice() {
            [article, next, ..] if article.eq_ignore_ascii_case("the") => next,
            [only] if only.eq_ignore_ascii_case("the") => return false,
            [first, ..] => first,
            [] => return false,
        };

        !self.non_place_words.contains(&first.to_lowercase())
            && !self.topic_vocabulary.is_match(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize;
    use vetchat_core::LocationKind;

    fn extractor() -> LocationExtractor {
        LocationExtractor::new(&LocationConfig::default(), &TopicCatalogConfig::default()).unwrap()
    }

    fn extract(text: &str) -> Option<LocationQuery> {
        extractor().extract(&normalize(text))
    }

    #[test]
    fn test_postal_code() {
        let query = extract("I need housing near 75201").unwrap();
        assert_eq!(query.text, "75201");
        assert_eq!(query.kind, LocationKind::PostalCode);
    }

    #[test]
    fn test_postal_code_is_whole_token() {
        assert!(extract("my claim number is 1234567").is_none());
        assert!(extract("call 1234").is_none());
        assert_eq!(extract("zip 75201-1234").unwrap().text, "75201");
    }

    #[test]
    fn test_postal_code_is_ascii_digits() {
        assert!(extract("near \u{0667}\u{0665}\u{0662}\u{0660}\u{0661}").is_none());
        assert!(extract("zip \u{FF17}\u{FF15}\u{FF12}\u{FF10}\u{FF11}").is_none());
    }

    #[test]
    fn test_postal_code_wins_over_place() {
        let query = extract("Any clinics in Austin, maybe 78701?").unwrap();
        assert_eq!(query.text, "78701");
        assert_eq!(query.kind, LocationKind::PostalCode);
    }

    #[test]
    fn test_place_name() {
        let query = extract("Find VA centers in Dallas").unwrap();
        assert_eq!(query.text, "dallas");
        assert_eq!(query.kind, LocationKind::PlaceName);

        assert_eq!(extract("I live in San Antonio.").unwrap().text, "san antonio");
        assert_eq!(extract("anything in dallas, tx").unwrap().text, "dallas");
        assert_eq!(extract("clinics in   el paso   ").unwrap().text, "el paso");
        assert_eq!(extract("I'm in the Bronx").unwrap().text, "the bronx");
    }

    #[test]
    fn test_place_name_requires_word_in() {
        assert!(extract("housing within austin").is_none());
        assert!(extract("I went into town").is_none());
    }

    #[test]
    fn test_rejects_non_place_phrases() {
        assert!(extract("I'm interested in jobs").is_none());
        assert!(extract("I am in need of help").is_none());
        assert!(extract("I'm in crisis").is_none());
        assert!(extract("please get in touch").is_none());
        assert!(extract("I'm in the").is_none());
    }

    #[test]
    fn test_rejects_topic_vocabulary() {
        let cases: &[(&str, &[&str])] = &[
            ("crisis", &["suicidal thoughts", "self harm", "ending my life"]),
            ("substance", &["alcohol", "drugs", "rehab", "sobriety", "addiction"]),
            ("housing", &["housing", "shelter", "homelessness", "eviction"]),
            (
                "benefits",
                &["the gi bill", "benefits", "a disability claim", "pension", "claims"],
            ),
            (
                "jobs",
                &["jobs", "careers", "a career", "employment", "unemployment", "a resume"],
            ),
        ];

        let catalog = TopicCatalogConfig::default();
        let covered: Vec<&str> = cases.iter().map(|(topic, _)| *topic).collect();
        assert_eq!(covered, catalog.topic_ids());

        let extractor = extractor();
        for (topic, phrases) in cases {
            for phrase in *phrases {
                let message = format!("I'm interested in {}", phrase);
                assert!(
                    extractor.extract(&normalize(&message)).is_none(),
                    "{} phrase extracted as a place: {}",
                    topic,
                    message
                );
            }
        }
    }

    #[test]
    fn test_rejects_service_phrases() {
        assert!(extract("I served in the army").is_none());
        assert!(extract("I was in the Navy.").is_none());
        assert!(extract("my son is in the marines").is_none());
        assert!(extract("I need help in filing a disability claim").is_none());
        assert!(extract("anyone in va care?").is_none());
    }

    #[test]
    fn test_topic_word_does_not_block_later_place() {
        let query = extract("I'm interested in housing in Tulsa").unwrap();
        assert_eq!(query.text, "tulsa");
    }

    #[test]
    fn test_invalid_catalog_pattern() {
        let mut catalog = TopicCatalogConfig::default();
        catalog.topics[1].patterns.push("(unclosed".to_string());
        assert!(LocationExtractor::new(&LocationConfig::default(), &catalog).is_err());
    }

    #[test]
    fn test_later_marker_is_tried() {
        let query = extract("I'm in need of a shelter in Tulsa").unwrap();
        assert_eq!(query.text, "tulsa");
    }

    #[test]
    fn test_rejects_long_candidates() {
        assert!(extract("I was stationed in germany for a very long time").is_none());
    }

    #[test]
    fn test_marker_blocked_by_other_characters() {
        // digits and apostrophes end the letters-and-spaces run without a terminator
        assert!(extract("in 2019 I left the army").is_none());
        assert!(extract("in o'hare terminal").is_none());
    }

    #[test]
    fn test_no_location() {
        assert!(extract("tell me a joke").is_none());
        assert!(extract("").is_none());
    }

    #[test]
    fn test_custom_word_list() {
        let config = LocationConfig {
            non_place_words: vec!["Paris".to_string()],
            max_place_words: 2,
        };
        let extractor = LocationExtractor::new(&config, &TopicCatalogConfig::default()).unwrap();
        assert!(extractor.extract("stationed in paris").is_none());
        assert_eq!(extractor.extract("stationed in need").unwrap().text, "need");
        assert!(extractor.extract("in new york city").is_none());
    }
}
