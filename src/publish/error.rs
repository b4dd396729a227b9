//! Threads publishing error types.

use thiserror::Error;

/// Errors raised while talking to the Threads Graph API or the media host.
/// These never escape the publisher; they are folded into `PublishOutcome`
/// diagnostics.
#[derive(Debug, Error)]
pub enum ThreadsError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Threads API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("not logged in to Threads")]
    NotLoggedIn,

    #[error("no media host configured for image uploads")]
    NoMediaHost,

    #[error("media upload failed (status {status}): {message}")]
    MediaUpload { status: u16, message: String },

    #[error("media container failed: {message}")]
    Container { message: String },

    #[error("media container was not ready in time")]
    ContainerTimeout,
}
