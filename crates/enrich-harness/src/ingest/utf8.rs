use std::borrow::Cow;

/// Incremental UTF-8 decoder that keeps an incomplete trailing sequence
/// until the next chunk arrives.
///
/// Bytes that can never form a valid sequence are replaced with U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Carry {
    pending: Vec<u8>,
}

impl Utf8Carry {
    /// Decodes as much of `pending + chunk` as possible.
    pub fn push(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let mut out = String::new();
        let mut start = 0;
        while start < self.pending.len() {
            match std::str::from_utf8(&self.pending[start..]) {
                Ok(text) => {
                    out.push_str(text);
                    start = self.pending.len();
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    out.push_str(&lossy(&self.pending[start..start + valid]));
                    match err.error_len() {
                        Some(invalid) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            start += valid + invalid;
                        }
                        None => {
                            start += valid;
                            break;
                        }
                    }
                }
            }
        }
        self.pending.drain(..start);
        out
    }

    /// Flushes whatever is still buffered. An unfinished sequence becomes
    /// U+FFFD.
    pub fn finish(&mut self) -> String {
        let out = lossy(&self.pending).into_owned();
        self.pending.clear();
        out
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

fn lossy(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carries_split_multibyte_sequence() {
        let bytes = "héllo 世界".as_bytes();
        // split inside 'é' and inside '世'
        let mut carry = Utf8Carry::default();
        let mut out = carry.push(&bytes[..2]);
        assert_eq!(out, "h");
        assert!(carry.has_pending());
        out.push_str(&carry.push(&bytes[2..8]));
        out.push_str(&carry.push(&bytes[8..]));
        assert_eq!(out, "héllo 世界");
        assert!(!carry.has_pending());
        assert_eq!(carry.finish(), "");
    }

    #[test]
    fn byte_at_a_time_matches_whole_decode() {
        let text = "Ünïcödé → 日本 🎉";
        let mut carry = Utf8Carry::default();
        let out: String = text.as_bytes().iter().map(|b| carry.push(&[*b])).collect();
        assert_eq!(out, text);
    }

    #[test]
    fn invalid_bytes_become_replacement_characters() {
        let mut carry = Utf8Carry::default();
        assert_eq!(carry.push(b"a\xFFb"), "a\u{FFFD}b");
    }

    #[test]
    fn unfinished_sequence_is_replaced_on_finish() {
        let mut carry = Utf8Carry::default();
        assert_eq!(carry.push(&[b'x', 0xE4, 0xB8]), "x");
        assert_eq!(carry.finish(), "\u{FFFD}");
    }
}
