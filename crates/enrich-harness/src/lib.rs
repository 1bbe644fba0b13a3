//! Completion providers and streamed-response ingestion for article
//! enrichment.
//!
//! Vendor-specific APIs are namespaced under `vendors::*`. Every provider
//! yields the same normalized events through [`RunStream`]: ordered text
//! deltas followed by exactly one [`CompletionResult`].
//!
//! # Streaming usage (OpenAI-compatible endpoint)
//!
//! ```no_run
//! use enrich_harness::prelude::*;
//! use enrich_harness::vendors::openai::{OpenAiClientConfig, OpenAiProvider};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), HarnessError> {
//! let provider = OpenAiProvider::new(OpenAiClientConfig::from_env()?)?;
//! let request = ChatRequest::new("gpt-4.1-nano")
//!     .system("You are a helpful assistant that provides concise summaries.")
//!     .user("Summarize: ...")
//!     .max_tokens(150)
//!     .streaming(true);
//!
//! let mut run = RunStream::start(&provider, request).await?;
//! while let Some(event) = run.next_event().await {
//!     if let StreamEvent::Delta(delta) = event {
//!         print!("{}", delta.text);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

/// Chat request payload types.
pub mod content;
/// Public error types used by the harness API.
pub mod errors;
/// Incremental decoding of streamed response bodies.
pub mod ingest;
/// Provider kinds, wire formats and transport options.
pub mod model;
/// Common imports for typical usage.
pub mod prelude;
/// Provider adapter contracts used by vendor integrations.
pub mod provider;
/// Pull-based run handle with terminal-event semantics.
pub mod run;
/// Normalized public stream events.
pub mod stream;
/// Vendor-specific integrations.
pub mod vendors;

pub use content::{ChatMessage, ChatRequest, ResponseFormat, Role};
pub use errors::{HarnessError, ProviderError, RunFailure};
pub use ingest::{DeltaDecoder, EnvelopeDecoder, NdjsonDecoder, Utf8Carry};
pub use model::{ProviderKind, RunOptions, WireFormat};
pub use provider::{ProviderAdapter, ProviderEvent, ProviderStreamHandle};
pub use run::RunStream;
pub use stream::{CompletionResult, DeltaEvent, StreamEvent};
