use serde::{Deserialize, Serialize};

/// Marker placed between the kept head and tail of a truncated text.
pub const TRUNCATION_SEPARATOR: &str = "\n...\n";

const DEFAULT_FALLBACK_MAX_LENGTH: usize = 15_000;

const fn default_fallback_max_length() -> usize {
    DEFAULT_FALLBACK_MAX_LENGTH
}

/// Bounds the size of article text sent to a model.
///
/// When `trigger_length` is non-zero and the text is longer than it, the
/// start/end rule keeps `keep_start` leading and `keep_end` trailing
/// characters. Otherwise the text is cut to `fallback_max_length`.
/// A `trigger_length` of `0` disables the start/end rule entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruncationPolicy {
    #[serde(default)]
    pub trigger_length: usize,
    #[serde(default)]
    pub keep_start: usize,
    #[serde(default)]
    pub keep_end: usize,
    #[serde(default = "default_fallback_max_length")]
    pub fallback_max_length: usize,
}

impl Default for TruncationPolicy {
    fn default() -> Self {
        Self::summary()
    }
}

impl TruncationPolicy {
    pub const fn new(
        trigger_length: usize,
        keep_start: usize,
        keep_end: usize,
        fallback_max_length: usize,
    ) -> Self {
        Self {
            trigger_length,
            keep_start,
            keep_end,
            fallback_max_length,
        }
    }

    /// Only the fallback length applies.
    pub const fn fallback_only(fallback_max_length: usize) -> Self {
        Self::new(0, 0, 0, fallback_max_length)
    }

    /// Defaults used for summary prompts.
    pub const fn summary() -> Self {
        Self::new(1_200, 1_000, 200, 15_000)
    }

    /// Defaults used for tagging prompts.
    pub const fn tagging() -> Self {
        Self::new(1_000, 800, 200, 10_000)
    }

    fn start_end_active(&self) -> bool {
        self.trigger_length > 0 && (self.keep_start > 0 || self.keep_end > 0)
    }

    fn effective_fallback(&self) -> usize {
        if self.fallback_max_length == 0 {
            DEFAULT_FALLBACK_MAX_LENGTH
        } else {
            self.fallback_max_length
        }
    }
}

/// Applies `policy` to `text`, counting Unicode scalar values.
///
/// If the kept parts cover the whole input, the text is returned unchanged.
/// The result never exceeds `max(fallback_max_length, len)`: a start/end
/// result that would, separator included, goes to the fallback rule
/// instead. With both keep counts at zero the rule is inactive and the
/// fallback length decides.
pub fn truncate(text: &str, policy: &TruncationPolicy) -> String {
    let len = text.chars().count();
    let max = policy.effective_fallback();

    if policy.start_end_active() && len > policy.trigger_length {
        if policy.keep_start.saturating_add(policy.keep_end) >= len {
            return text.to_string();
        }
        let both = policy.keep_start > 0 && policy.keep_end > 0;
        let separator = if both { TRUNCATION_SEPARATOR } else { "" };
        let out_len = policy.keep_start + policy.keep_end + separator.chars().count();
        if out_len <= max.max(len) {
            let head = head_chars(text, policy.keep_start);
            let tail = tail_chars(text, len, policy.keep_end);
            return format!("{head}{separator}{tail}");
        }
    }

    if len > max {
        return head_chars(text, max).to_string();
    }
    text.to_string()
}

fn head_chars(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn tail_chars(text: &str, len: usize, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    if n >= len {
        return text;
    }
    match text.char_indices().nth(len - n) {
        Some((idx, _)) => &text[idx..],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_head_and_tail_around_separator() {
        let policy = TruncationPolicy::new(5, 2, 2, 100);
        assert_eq!(truncate("0123456789", &policy), "01\n...\n89");
    }

    #[test]
    fn overlapping_parts_leave_text_unchanged() {
        let policy = TruncationPolicy::new(1, 5, 5, 100);
        assert_eq!(truncate("ab", &policy), "ab");
    }

    #[test]
    fn separator_may_lengthen_text_within_the_fallback_bound() {
        let policy = TruncationPolicy::new(5, 4, 4, 100);
        assert_eq!(truncate("0123456789AB", &policy), "0123\n...\n89AB");
    }

    #[test]
    fn result_longer_than_fallback_and_input_uses_fallback() {
        let policy = TruncationPolicy::new(5, 4, 4, 3);
        assert_eq!(truncate("0123456789", &policy), "012");
        let roomy = TruncationPolicy::new(5, 4, 4, 10);
        assert_eq!(truncate("0123456789", &roomy), "0123456789");
    }

    #[test]
    fn only_head_when_keep_end_is_zero() {
        let policy = TruncationPolicy::new(3, 4, 0, 100);
        assert_eq!(truncate("0123456789", &policy), "0123");
    }

    #[test]
    fn only_tail_when_keep_start_is_zero() {
        let policy = TruncationPolicy::new(3, 0, 3, 100);
        assert_eq!(truncate("0123456789", &policy), "789");
    }

    #[test]
    fn zero_keep_counts_fall_through_to_fallback() {
        let policy = TruncationPolicy::new(3, 0, 0, 4);
        assert_eq!(truncate("0123456789", &policy), "0123");
        let roomy = TruncationPolicy::new(3, 0, 0, 100);
        assert_eq!(truncate("0123456789", &roomy), "0123456789");
    }

    #[test]
    fn zero_trigger_never_consults_keep_counts() {
        let policy = TruncationPolicy::new(0, 1, 1, 6);
        assert_eq!(truncate("0123456789", &policy), "012345");
    }

    #[test]
    fn below_trigger_uses_fallback() {
        let policy = TruncationPolicy::new(50, 2, 2, 4);
        assert_eq!(truncate("0123456789", &policy), "0123");
    }

    #[test]
    fn slices_on_char_boundaries() {
        let policy = TruncationPolicy::new(3, 2, 2, 100);
        assert_eq!(truncate("ééééééééééé", &policy), "éé\n...\néé");
        assert_eq!(truncate("日本語テキスト", &TruncationPolicy::fallback_only(3)), "日本語");
    }

    #[test]
    fn empty_text_stays_empty() {
        assert_eq!(truncate("", &TruncationPolicy::summary()), "");
    }

    #[test]
    fn length_never_exceeds_fallback_or_input() {
        let text: String = "abcdefghijklmnopqrstuvwxyz".repeat(3);
        let len = text.chars().count();
        for trigger in [0, 1, 10, 40, 100] {
            for keep_start in [0, 1, 5, 30, 80] {
                for keep_end in [0, 2, 7, 50] {
                    for fallback in [1, 5, 20, 78, 200] {
                        let policy = TruncationPolicy::new(trigger, keep_start, keep_end, fallback);
                        let out = truncate(&text, &policy).chars().count();
                        assert!(out <= fallback.max(len), "{policy:?} produced {out} chars");
                    }
                }
            }
        }
    }

    #[test]
    fn zero_fallback_uses_default_limit() {
        let policy = TruncationPolicy::fallback_only(0);
        assert_eq!(truncate("short", &policy), "short");
    }

    #[test]
    fn deserializes_with_defaults() {
        let policy: TruncationPolicy =
            serde_json::from_str(r#"{"trigger_length":10}"#).expect("policy");
        assert_eq!(policy, TruncationPolicy::new(10, 0, 0, 15_000));
    }
}
