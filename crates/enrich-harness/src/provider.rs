use std::pin::Pin;

use futures::Stream;

use crate::content::ChatRequest;
use crate::errors::ProviderError;
use crate::model::ProviderKind;

/// Event produced by a provider stream before normalization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProviderEvent {
    /// A piece of generated text. Empty deltas are dropped by the run.
    TextDelta { text: String },
    /// The provider reported completion before the body ended.
    Completed,
}

/// Boxed stream of provider events.
pub type ProviderEventStream =
    Pin<Box<dyn Stream<Item = Result<ProviderEvent, ProviderError>> + Send + 'static>>;

/// A started provider response.
pub struct ProviderStreamHandle {
    pub stream: ProviderEventStream,
}

impl ProviderStreamHandle {
    pub fn new(stream: impl Stream<Item = Result<ProviderEvent, ProviderError>> + Send + 'static) -> Self {
        Self {
            stream: Box::pin(stream),
        }
    }
}

/// Contract implemented by each vendor integration.
#[async_trait::async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Sends `request` with streaming enabled and returns the decoded event
    /// stream. Connect failures and non-2xx statuses are returned here.
    async fn start_stream(&self, request: ChatRequest)
    -> Result<ProviderStreamHandle, ProviderError>;

    /// Sends `request` without streaming and returns the generated text.
    async fn complete(&self, request: ChatRequest) -> Result<String, ProviderError>;
}
