//! Agent trait for abstraction and testability
//!
//! The HTTP layer depends on this trait rather than on [`crate::ReplyComposer`],
//! so router tests can run against a scripted agent.

use async_trait::async_trait;
use vetchat_core::{Reply, Result};

/// Message-in, reply-out agent
#[async_trait]
pub trait Agent: Send + Sync {
    /// Compose the reply to one message
    ///
    /// Blank messages are rejected with a validation error.
    async fn reply(&self, message: &str) -> Result<Reply>;

    /// Whether the generative fallback can currently be reached
    async fn is_ready(&self) -> bool;

    /// Number of topics (crisis included) the agent recognizes
    fn topic_count(&self) -> usize;
}
