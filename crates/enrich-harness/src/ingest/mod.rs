//! Turns raw response bytes into ordered provider events.
//!
//! Both wire decoders share one buffering contract: bytes go through a
//! [`Utf8Carry`] so multi-byte characters split across chunks survive, and
//! anything incomplete stays buffered until more bytes or the end of the
//! body arrive.

mod envelope;
mod ndjson;
mod utf8;

use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt as _};

use crate::errors::ProviderError;
use crate::model::{ProviderKind, WireFormat};
use crate::provider::ProviderEvent;

pub use envelope::EnvelopeDecoder;
pub(crate) use envelope::envelope_content;
pub use ndjson::NdjsonDecoder;
pub use utf8::Utf8Carry;

/// Incremental decoder for one response body.
pub trait DeltaDecoder: Send {
    /// Feeds one transport chunk and returns the events it completed.
    fn push(&mut self, chunk: &[u8]) -> Result<Vec<ProviderEvent>, serde_json::Error>;

    /// Called once at end of body to flush anything still buffered.
    fn finish(&mut self) -> Result<Vec<ProviderEvent>, serde_json::Error>;
}

/// Returns a fresh decoder for `format`.
pub fn decoder_for(format: WireFormat) -> Box<dyn DeltaDecoder> {
    match format {
        WireFormat::Envelope => Box::new(EnvelopeDecoder::default()),
        WireFormat::Ndjson => Box::new(NdjsonDecoder::default()),
    }
}

type ChunkStream<E> = Pin<Box<dyn Stream<Item = Result<Bytes, E>> + Send + 'static>>;

/// Adapts a byte stream into provider events using `decoder`.
///
/// A transport read error or a fatal decode error ends the stream with an
/// `Err`; no further bytes are read afterwards.
pub fn delta_stream<S, E>(
    provider: ProviderKind,
    bytes: S,
    decoder: Box<dyn DeltaDecoder>,
) -> impl Stream<Item = Result<ProviderEvent, ProviderError>> + Send + 'static
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    struct State<E> {
        provider: ProviderKind,
        bytes: ChunkStream<E>,
        decoder: Box<dyn DeltaDecoder>,
        pending: VecDeque<ProviderEvent>,
        done: bool,
    }

    stream::try_unfold(
        State {
            provider,
            bytes: Box::pin(bytes) as ChunkStream<E>,
            decoder,
            pending: VecDeque::new(),
            done: false,
        },
        |mut state| async move {
            loop {
                if let Some(event) = state.pending.pop_front() {
                    return Ok(Some((event, state)));
                }
                if state.done {
                    return Ok(None);
                }

                match state.bytes.next().await {
                    Some(Ok(chunk)) => {
                        let events = state.decoder.push(&chunk).map_err(|e| {
                            ProviderError::decode(
                                state.provider.clone(),
                                format!("invalid response envelope: {e}"),
                            )
                        })?;
                        state.pending.extend(events);
                    }
                    Some(Err(e)) => {
                        return Err(ProviderError::transport(
                            state.provider,
                            format!("streaming read failed: {e}"),
                            None,
                        ));
                    }
                    None => {
                        state.done = true;
                        let events = state.decoder.finish().map_err(|e| {
                            ProviderError::decode(
                                state.provider.clone(),
                                format!("invalid trailing response data: {e}"),
                            )
                        })?;
                        state.pending.extend(events);
                    }
                }
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks(parts: &[&'static str]) -> Vec<Result<Bytes, String>> {
        parts
            .iter()
            .map(|part| Ok(Bytes::from_static(part.as_bytes())))
            .collect()
    }

    async fn collect(
        format: WireFormat,
        input: Vec<Result<Bytes, String>>,
    ) -> Vec<Result<ProviderEvent, ProviderError>> {
        delta_stream(
            ProviderKind::Ollama,
            stream::iter(input),
            decoder_for(format),
        )
        .collect()
        .await
    }

    #[tokio::test]
    async fn ndjson_stream_yields_deltas_in_order() {
        let events = collect(
            WireFormat::Ndjson,
            chunks(&[
                "{\"response\":\"Hel",
                "lo\"}\n{\"respon",
                "se\":\" world\"}\n",
            ]),
        )
        .await;
        assert_eq!(
            events,
            vec![
                Ok(ProviderEvent::TextDelta {
                    text: "Hello".into()
                }),
                Ok(ProviderEvent::TextDelta {
                    text: " world".into()
                }),
            ]
        );
    }

    #[tokio::test]
    async fn transport_error_ends_stream_without_reading_further() {
        let mut input = chunks(&["{\"response\":\"A\"}\n"]);
        input.push(Err("connection reset".to_string()));
        input.extend(chunks(&["{\"response\":\"B\"}\n"]));
        let events = collect(WireFormat::Ndjson, input).await;
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[1],
            Err(ProviderError::Transport { message, .. }) if message.contains("connection reset")
        ));
    }

    #[tokio::test]
    async fn envelope_decode_error_is_fatal() {
        let events = collect(
            WireFormat::Envelope,
            chunks(&[
                r#"{"choices":[{"message":{"content":"ok"}}]}"#,
                "not json",
                r#"{"choices":[{"message":{"content":"never"}}]}"#,
            ]),
        )
        .await;
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], Err(ProviderError::Decode { .. })));
    }
}
