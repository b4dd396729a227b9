//! Completion client trait.

use async_trait::async_trait;

use super::error::CompletionError;
use crate::media::ImageData;

/// A client that turns a prompt (and optional image) into generated text.
///
/// Contract: at most one outbound call per invocation, no internal retry, no
/// caching. Provider-level failures surface unmodified as `CompletionError`.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        image: Option<&ImageData>,
    ) -> Result<String, CompletionError>;
}
