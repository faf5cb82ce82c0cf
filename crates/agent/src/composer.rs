//! Reply Composer
//!
//! Single entry point turning a message into a reply. Decision order:
//! 1. crisis language, when crisis-first routing is on (the default)
//! 2. a location in the message: facility lookup
//! 3. crisis language, when crisis-first routing is off
//! 4. matched support topics, replies joined by a blank line
//! 5. the generative fallback, given the raw message

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

use vetchat_config::{Settings, TopicCatalogConfig};
use vetchat_core::{Classifier, Error, Reply, ReplyRoute, Result};
use vetchat_llm::{create_backend, LlmBackend, Message};
use vetchat_text_processing::{normalize, LocationExtractor, TopicClassifier};
use vetchat_tools::{LocationResolver, NominatimGeocoder, VaFacilitiesDirectory};

use crate::traits::Agent;

/// Separator between topic replies
const TOPIC_SEPARATOR: &str = "\n\n";

/// Composes replies from the classifier, the location path and the fallback
pub struct ReplyComposer {
    classifier: Arc<dyn Classifier>,
    extractor: LocationExtractor,
    resolver: LocationResolver,
    fallback: Arc<dyn LlmBackend>,
    crisis_first: bool,
}

impl ReplyComposer {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        extractor: LocationExtractor,
        resolver: LocationResolver,
        fallback: Arc<dyn LlmBackend>,
    ) -> Self {
        Self {
            classifier,
            extractor,
            resolver,
            fallback,
            crisis_first: true,
        }
    }

    /// Check crisis language before location handling (default: on)
    pub fn with_crisis_first(mut self, crisis_first: bool) -> Self {
        self.crisis_first = crisis_first;
        self
    }

    /// Wire the production collaborators from settings
    pub fn from_settings(settings: &Settings, catalog: &TopicCatalogConfig) -> Result<Self> {
        let classifier = Arc::new(TopicClassifier::new(catalog)?);
        let extractor = LocationExtractor::new(&settings.location, catalog)?;

        let geocoder = NominatimGeocoder::new(settings.geocoding.clone())
            .map_err(|e| Error::Configuration(e.to_string()))?;
        let directory = VaFacilitiesDirectory::new(&settings.facilities)
            .map_err(|e| Error::Configuration(e.to_string()))?;
        let resolver =
            LocationResolver::new(Arc::new(geocoder), Arc::new(directory), &settings.facilities);

        let fallback = create_backend(&settings.fallback)?;

        tracing::info!(
            classifier = classifier.name(),
            topics = classifier.topic_count(),
            crisis_first = settings.routing.crisis_first,
            "Reply composer ready"
        );

        Ok(Self::new(classifier, extractor, resolver, fallback)
            .with_crisis_first(settings.routing.crisis_first))
    }

    pub fn classifier(&self) -> &Arc<dyn Classifier> {
        &self.classifier
    }

    /// Compose the reply to one message
    pub async fn compose(&self, message: &str) -> Result<Reply> {
        if message.trim().is_empty() {
            return Err(Error::Validation("Message required".to_string()));
        }

        let text = normalize(message);
        let classification = self.classifier.classify(&text);

        let reply = if self.crisis_first && classification.crisis {
            self.crisis_reply()
        } else if let Some(query) = self.extractor.extract(&text) {
            let reply_text = self.resolver.resolve(&query).await?;
            Reply::new(reply_text, ReplyRoute::Location)
        } else if classification.crisis {
            self.crisis_reply()
        } else if !classification.topics.is_empty() {
            let replies: Vec<&str> = classification
                .topics
                .iter()
                .filter_map(|topic| self.classifier.reply_for(topic))
                .collect();
            Reply::new(replies.join(TOPIC_SEPARATOR), ReplyRoute::Topics)
        } else {
            Reply::new(self.generate(message).await?, ReplyRoute::Fallback)
        };

        metrics::counter!("vetchat_replies_total", "route" => reply.route.as_str()).increment(1);
        tracing::info!(
            route = %reply.route,
            topics = ?classification.topics,
            crisis = classification.crisis,
            "Composed reply"
        );

        Ok(reply)
    }

    fn crisis_reply(&self) -> Reply {
        Reply::new(self.classifier.crisis_reply(), ReplyRoute::Crisis)
    }

    /// Raw message as a single user turn; the completion is returned verbatim
    async fn generate(&self, message: &str) -> Result<String> {
        let start = Instant::now();
        let result = self.fallback.generate(&[Message::user(message)]).await;
        metrics::histogram!("vetchat_external_call_seconds", "service" => vetchat_llm::SERVICE_NAME)
            .record(start.elapsed().as_secs_f64());

        match result {
            Ok(generation) => {
                tracing::debug!(
                    model = self.fallback.model_name(),
                    tokens = generation.tokens,
                    total_time_ms = generation.total_time_ms,
                    "Fallback generated"
                );
                Ok(generation.text)
            }
            Err(e) => {
                metrics::counter!("vetchat_external_errors_total", "service" => vetchat_llm::SERVICE_NAME)
                    .increment(1);
                tracing::warn!(model = self.fallback.model_name(), error = %e, "Fallback failed");
                Err(e.into())
            }
        }
    }
}

#[async_trait]
impl Agent for ReplyComposer {
    async fn reply(&self, message: &str) -> Result<Reply> {
        self.compose(message).await
    }

    async fn is_ready(&self) -> bool {
        self.fallback.is_available().await
    }

    fn topic_count(&self) -> usize {
        self.classifier.topic_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vetchat_config::{FacilitiesConfig, LocationConfig};
    use vetchat_llm::{FinishReason, GenerationResult, LlmError};
    use vetchat_tools::{StubFacilityDirectory, StubGeocoder};

    struct EchoBackend;

    #[async_trait]
    impl LlmBackend for EchoBackend {
        async fn generate(
            &self,
            messages: &[Message],
        ) -> std::result::Result<GenerationResult, LlmError> {
            Ok(GenerationResult {
                text: format!("echo: {}", messages[0].content),
                tokens: 2,
                total_time_ms: 1,
                finish_reason: FinishReason::Stop,
            })
        }

        async fn is_available(&self) -> bool {
            true
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    fn composer() -> ReplyComposer {
        let resolver = LocationResolver::new(
            Arc::new(StubGeocoder::not_found()),
            Arc::new(StubFacilityDirectory::default()),
            &FacilitiesConfig::default(),
        );
        ReplyComposer::new(
            Arc::new(TopicClassifier::new(&TopicCatalogConfig::default()).unwrap()),
            LocationExtractor::new(&LocationConfig::default(), &TopicCatalogConfig::default())
                .unwrap(),
            resolver,
            Arc::new(EchoBackend),
        )
    }

    #[tokio::test]
    async fn test_blank_message_rejected() {
        let err = composer().compose("   ").await.unwrap_err();
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_fallback_gets_raw_message() {
        let reply = composer().compose("Tell me a JOKE").await.unwrap();
        assert_eq!(reply.route, ReplyRoute::Fallback);
        assert_eq!(reply.text, "echo: Tell me a JOKE");
    }

    #[tokio::test]
    async fn test_topic_replies_joined() {
        let composer = composer();
        let reply = composer.compose("shelter and a disability claim").await.unwrap();
        let classifier = composer.classifier();
        let expected = format!(
            "{}\n\n{}",
            classifier.reply_for("housing").unwrap(),
            classifier.reply_for("benefits").unwrap()
        );
        assert_eq!(reply.route, ReplyRoute::Topics);
        assert_eq!(reply.text, expected);
    }

    #[tokio::test]
    async fn test_agent_trait() {
        let composer = composer();
        assert!(composer.is_ready().await);
        assert_eq!(Agent::topic_count(&composer), 5);
    }
}
