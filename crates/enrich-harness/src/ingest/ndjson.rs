use serde_json::Value;
use tracing::{debug, warn};

use super::{DeltaDecoder, Utf8Carry};
use crate::provider::ProviderEvent;

/// Decoder for newline-delimited JSON bodies (`{"response": "..."}` per
/// line).
///
/// Lines may be split across chunks; the unterminated remainder stays
/// buffered. Malformed lines are logged and skipped, so this decoder never
/// fails.
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    utf8: Utf8Carry,
    buffer: String,
}

impl NdjsonDecoder {
    fn drain_lines(&mut self) -> Vec<ProviderEvent> {
        let mut events = Vec::new();
        while let Some(newline) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline).collect();
            decode_line(&line, &mut events);
        }
        events
    }
}

impl DeltaDecoder for NdjsonDecoder {
    fn push(&mut self, chunk: &[u8]) -> Result<Vec<ProviderEvent>, serde_json::Error> {
        let text = self.utf8.push(chunk);
        self.buffer.push_str(&text);
        Ok(self.drain_lines())
    }

    fn finish(&mut self) -> Result<Vec<ProviderEvent>, serde_json::Error> {
        let tail = self.utf8.finish();
        self.buffer.push_str(&tail);
        let mut events = self.drain_lines();
        let rest = std::mem::take(&mut self.buffer);
        decode_line(&rest, &mut events);
        Ok(events)
    }
}

fn decode_line(line: &str, events: &mut Vec<ProviderEvent>) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }
    let value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(err) => {
            warn!(
                event = "ingest.ndjson_line_skipped",
                domain = "ingest",
                error = %err,
                line_len = line.len() as u64,
                "skipping malformed stream line"
            );
            return;
        }
    };
    match value.get("response").and_then(Value::as_str) {
        Some(text) => events.push(ProviderEvent::TextDelta {
            text: text.to_string(),
        }),
        None => debug!(event = "ingest.ndjson_no_response", domain = "ingest"),
    }
    if value.get("done").and_then(Value::as_bool) == Some(true) {
        events.push(ProviderEvent::Completed);
    }
}
