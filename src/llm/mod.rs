//! LLM completion client.

mod anthropic;
mod client;
mod error;

pub use anthropic::AnthropicClient;
pub use client::CompletionClient;
pub use error::CompletionError;
