//! Publishing client for mirroring assistant replies to Threads.

mod error;
mod media_host;
mod threads;

pub use error::ThreadsError;
pub use media_host::MediaHost;
pub use threads::ThreadsPublisher;

use async_trait::async_trait;
use serde::Serialize;

use crate::media::ImageData;

/// The result of attempting to publish one reply.
///
/// Publishing is a side effect of the conversation, not a precondition for it,
/// so failures are carried here as data and never propagated as errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishOutcome {
    pub posted: bool,
    pub message: String,
}

impl PublishOutcome {
    pub fn posted(message: impl Into<String>) -> Self {
        Self {
            posted: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            posted: false,
            message: message.into(),
        }
    }
}

/// A client that posts text (and optionally an image) to a social platform.
///
/// Contract: at most one publish attempt per invocation, and every platform
/// error is contained at this boundary. The signature is deliberately
/// infallible; a publishing failure must never prevent the caller from seeing
/// its completion.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, text: &str, image: Option<&ImageData>) -> PublishOutcome;
}
