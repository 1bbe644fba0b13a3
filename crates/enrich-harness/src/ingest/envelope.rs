use serde_json::Value;

use super::{DeltaDecoder, Utf8Carry};
use crate::provider::ProviderEvent;

/// Decoder for bodies where every transport chunk holds whole JSON
/// envelopes of the form `{ "choices": [{ "message": { "content": ... } }] }`.
///
/// A chunk that is not valid JSON is fatal. Envelopes without a content
/// string produce no delta.
#[derive(Debug, Default)]
pub struct EnvelopeDecoder {
    utf8: Utf8Carry,
}

impl EnvelopeDecoder {
    fn decode_text(text: &str) -> Result<Vec<ProviderEvent>, serde_json::Error> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let mut events = Vec::new();
        for value in serde_json::Deserializer::from_str(text).into_iter::<Value>() {
            if let Some(content) = envelope_content(&value?) {
                events.push(ProviderEvent::TextDelta {
                    text: content.to_string(),
                });
            }
        }
        Ok(events)
    }
}

impl DeltaDecoder for EnvelopeDecoder {
    fn push(&mut self, chunk: &[u8]) -> Result<Vec<ProviderEvent>, serde_json::Error> {
        let text = self.utf8.push(chunk);
        Self::decode_text(&text)
    }

    fn finish(&mut self) -> Result<Vec<ProviderEvent>, serde_json::Error> {
        let text = self.utf8.finish();
        Self::decode_text(&text)
    }
}

/// `choices[0].message.content`, or `choices[0].delta.content` for
/// incremental envelopes.
pub(crate) fn envelope_content(value: &Value) -> Option<&str> {
    let choice = value.get("choices")?.get(0)?;
    choice
        .get("message")
        .and_then(|message| message.get("content"))
        .or_else(|| choice.get("delta").and_then(|delta| delta.get("content")))
        .and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(events: Vec<ProviderEvent>) -> Vec<String> {
        events
            .into_iter()
            .filter_map(|event| match event {
                ProviderEvent::TextDelta { text } => Some(text),
                ProviderEvent::Completed => None,
            })
            .collect()
    }

    #[test]
    fn decodes_one_envelope_per_chunk() {
        let mut decoder = EnvelopeDecoder::default();
        let events = decoder
            .push(br#"{"choices":[{"message":{"content":"Hi"}}]}"#)
            .expect("decode");
        assert_eq!(texts(events), vec!["Hi"]);
    }

    #[test]
    fn missing_content_path_is_an_empty_delta() {
        let mut decoder = EnvelopeDecoder::default();
        let events = decoder.push(br#"{"choices":[]}"#).expect("decode");
        assert!(events.is_empty());
        let events = decoder.push(br#"{"id":"x"}"#).expect("decode");
        assert!(events.is_empty());
    }

    #[test]
    fn coalesced_envelopes_in_one_chunk_are_all_read() {
        let mut decoder = EnvelopeDecoder::default();
        let events = decoder
            .push(
                br#"{"choices":[{"message":{"content":"a"}}]}
{"choices":[{"delta":{"content":"b"}}]}"#,
            )
            .expect("decode");
        assert_eq!(texts(events), vec!["a", "b"]);
    }

    #[test]
    fn non_json_chunk_is_fatal() {
        let mut decoder = EnvelopeDecoder::default();
        assert!(decoder.push(b"<html>bad gateway</html>").is_err());
    }

    #[test]
    fn whitespace_chunks_are_ignored() {
        let mut decoder = EnvelopeDecoder::default();
        assert!(decoder.push(b"\n  \n").expect("decode").is_empty());
        assert!(decoder.finish().expect("finish").is_empty());
    }
}
