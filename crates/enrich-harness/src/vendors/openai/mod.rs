//! OpenAI chat completions (`/v1/chat/completions`) and compatible servers.
//!
//! Streamed bodies are read as JSON envelopes, not server-sent events.
mod adapter;
mod config;

pub use adapter::OpenAiProvider;
pub use config::OpenAiClientConfig;
