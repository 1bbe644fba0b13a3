use futures::StreamExt as _;
use futures::stream;
use tracing::{debug, warn};

use crate::content::ChatRequest;
use crate::errors::{HarnessError, ProviderError, RunFailure};
use crate::model::ProviderKind;
use crate::provider::{ProviderAdapter, ProviderEvent, ProviderEventStream, ProviderStreamHandle};
use crate::stream::{CompletionResult, DeltaEvent, StreamEvent};

/// Pull-based handle over one streamed completion.
///
/// Yields `StreamEvent::Delta` values in arrival order followed by exactly
/// one `StreamEvent::Finished`. After the terminal event the underlying
/// body is dropped and `next_event()` returns `None`.
pub struct RunStream {
    provider: ProviderKind,
    events: ProviderEventStream,
    seq: u64,
    full_text: String,
    result: Option<CompletionResult>,
}

impl RunStream {
    /// Validates `request`, enables streaming and starts it on `provider`.
    ///
    /// Only request validation fails here. Connect failures and error
    /// statuses surface as the run's terminal `CompletionResult::Failed`.
    pub async fn start(
        provider: &dyn ProviderAdapter,
        request: ChatRequest,
    ) -> Result<Self, HarnessError> {
        request.validate()?;
        let kind = provider.kind();
        debug!(
            event = "run.start",
            domain = "harness",
            provider = %kind,
            model = %request.model,
            max_tokens = request.max_tokens
        );
        let handle = match provider.start_stream(request.streaming(true)).await {
            Ok(handle) => handle,
            Err(err) => ProviderStreamHandle::new(stream::once(async move { Err(err) })),
        };
        Ok(Self::from_handle(kind, handle))
    }

    /// Wraps an already started provider stream.
    pub fn from_handle(provider: ProviderKind, handle: ProviderStreamHandle) -> Self {
        Self {
            provider,
            events: handle.stream,
            seq: 0,
            full_text: String::new(),
            result: None,
        }
    }

    pub fn provider(&self) -> &ProviderKind {
        &self.provider
    }

    /// Text received so far.
    pub fn text_so_far(&self) -> &str {
        &self.full_text
    }

    /// Waits for and returns the next normalized stream event.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        if self.result.is_some() {
            return None;
        }
        loop {
            match self.events.next().await {
                Some(Ok(ProviderEvent::TextDelta { text })) => {
                    if text.is_empty() {
                        continue;
                    }
                    let seq = self.seq;
                    self.seq = self.seq.saturating_add(1);
                    self.full_text.push_str(&text);
                    debug!(event = "run.delta", domain = "harness", provider = %self.provider, seq);
                    return Some(StreamEvent::Delta(DeltaEvent { seq, text }));
                }
                Some(Ok(ProviderEvent::Completed)) | None => {
                    let full_text = std::mem::take(&mut self.full_text);
                    return Some(self.terminate(CompletionResult::Done { full_text }));
                }
                Some(Err(err)) => return Some(self.fail(&err)),
            }
        }
    }

    /// Drains the stream (if needed) and returns the terminal result.
    ///
    /// Safe to call after consuming events manually with `next_event()`.
    pub async fn finish(mut self) -> CompletionResult {
        while self.result.is_none() {
            if self.next_event().await.is_none() {
                break;
            }
        }
        self.result.unwrap_or_else(|| CompletionResult::Done {
            full_text: String::new(),
        })
    }

    fn fail(&mut self, err: &ProviderError) -> StreamEvent {
        let failure = RunFailure::from(err);
        warn!(
            event = "run.failed",
            domain = "harness",
            provider = %self.provider,
            error = %failure,
            "completion stream failed"
        );
        self.terminate(CompletionResult::Failed { failure })
    }

    fn terminate(&mut self, result: CompletionResult) -> StreamEvent {
        self.events = Box::pin(stream::empty());
        debug!(
            event = "run.finished",
            domain = "harness",
            provider = %self.provider,
            deltas = self.seq,
            ok = result.is_done()
        );
        self.result = Some(result.clone());
        StreamEvent::Finished(result)
    }
}
