//! The conversation-and-publish pipeline.
//!
//! One inbound request becomes a completed, logged, and best-effort published
//! exchange, in strictly that order: completion first (fatal on failure),
//! then the log append, then the publish side effect (never fatal).

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::llm::{CompletionClient, CompletionError};
use crate::media::ImageData;
use crate::publish::{PublishOutcome, Publisher};
use crate::session::{SessionStore, Turn};

/// A completed exchange: the assistant's reply plus the publish result.
#[derive(Debug)]
pub struct ChatExchange {
    pub response: String,
    pub publish: PublishOutcome,
}

/// Failures on the mandatory path. Publish failures never appear here; they
/// are data inside `ChatExchange`.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("prompt and image are both empty")]
    InvalidRequest,

    #[error("completion failed: {0}")]
    CompletionFailed(#[from] CompletionError),
}

/// Orchestrates one request: validate, complete, log, publish.
#[derive(Clone)]
pub struct Pipeline {
    completions: Arc<dyn CompletionClient>,
    publisher: Arc<dyn Publisher>,
    sessions: SessionStore,
}

impl Pipeline {
    pub fn new(
        completions: Arc<dyn CompletionClient>,
        publisher: Arc<dyn Publisher>,
        sessions: SessionStore,
    ) -> Self {
        Self {
            completions,
            publisher,
            sessions,
        }
    }

    /// Handle one chat request for a session.
    ///
    /// On completion failure nothing is logged and no publish is attempted.
    /// On publish failure the exchange still succeeds; the outcome carries
    /// the diagnostic.
    pub async fn handle_request(
        &self,
        session_id: &str,
        prompt: &str,
        image: Option<ImageData>,
    ) -> Result<ChatExchange, PipelineError> {
        if prompt.trim().is_empty() && image.is_none() {
            return Err(PipelineError::InvalidRequest);
        }

        let response = self.completions.complete(prompt, image.as_ref()).await?;
        debug!(session_id, chars = response.len(), "completion received");

        self.sessions
            .append_exchange(
                session_id,
                Turn::user(prompt, image.is_some()),
                Turn::assistant(&response),
            )
            .await;

        let publish = self.publisher.publish(&response, image.as_ref()).await;
        debug!(session_id, posted = publish.posted, "publish attempted");

        Ok(ChatExchange { response, publish })
    }

    /// Empty the session's conversation. Idempotent.
    pub async fn clear(&self, session_id: &str) {
        self.sessions.clear(session_id).await;
    }

    /// Snapshot of the session's conversation in chronological order.
    pub async fn conversation(&self, session_id: &str) -> Vec<Turn> {
        self.sessions.turns(session_id).await
    }
}
