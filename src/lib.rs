//! Promptpipe - a chat relay that answers prompts with an LLM and mirrors
//! the assistant's replies to Threads.

pub mod config;
pub mod handlers;
pub mod llm;
pub mod media;
pub mod pipeline;
pub mod publish;
pub mod response;
pub mod server;
pub mod session;
pub mod tokens;
