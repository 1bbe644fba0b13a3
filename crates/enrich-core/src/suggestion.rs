//! Interprets the text a model returned for a tagging request.

use serde_json::Value;
use tracing::warn;

/// What could be recovered from a tagging response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionOutcome {
    /// The response was JSON with `labels` and/or `tags` arrays, or a bare
    /// array of tags.
    Structured {
        labels: Vec<String>,
        tags: Vec<String>,
    },
    /// The response was not JSON but looked like a comma separated list.
    /// Best effort only: the pieces may not be meaningful.
    FreeTextFallback { candidates: Vec<String> },
    /// Nothing usable.
    Unparseable,
}

impl SuggestionOutcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::FreeTextFallback { .. })
    }
}

/// Parses model output into tag/label candidates.
///
/// Accepted shapes, in order: `{"labels": [...], "tags": [...]}` (either key
/// may be missing), a bare JSON array of tags, and as a last resort a comma
/// separated list with at most `max_tags * 2` pieces, capped to `max_tags`.
/// JSON of any other shape is unparseable; comma splitting is only tried on
/// text that is not JSON at all. A fenced code block around the JSON is
/// tolerated.
pub fn parse_suggestions(content: &str, max_tags: usize) -> SuggestionOutcome {
    let trimmed = strip_code_fence(content.trim());
    if trimmed.is_empty() {
        return SuggestionOutcome::Unparseable;
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => {
            let labels = map.get("labels").and_then(Value::as_array);
            let tags = map.get("tags").and_then(Value::as_array);
            if labels.is_none() && tags.is_none() {
                warn!(
                    event = "suggestion.unexpected_shape",
                    domain = "suggestion",
                    keys = ?map.keys().collect::<Vec<_>>()
                );
                return SuggestionOutcome::Unparseable;
            }
            SuggestionOutcome::Structured {
                labels: labels.map(|items| string_items(items)).unwrap_or_default(),
                tags: tags.map(|items| string_items(items)).unwrap_or_default(),
            }
        }
        Ok(Value::Array(items)) => SuggestionOutcome::Structured {
            labels: Vec::new(),
            tags: string_items(&items),
        },
        Ok(_) => SuggestionOutcome::Unparseable,
        Err(_) => comma_fallback(trimmed, max_tags),
    }
}

fn comma_fallback(text: &str, max_tags: usize) -> SuggestionOutcome {
    let pieces: Vec<String> = text
        .split(',')
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect();
    if pieces.is_empty() || pieces.len() > max_tags.saturating_mul(2) {
        return SuggestionOutcome::Unparseable;
    }
    warn!(
        event = "suggestion.comma_fallback",
        domain = "suggestion",
        pieces = pieces.len() as u64,
        "model response was not JSON; falling back to comma splitting"
    );
    SuggestionOutcome::FreeTextFallback {
        candidates: pieces.into_iter().take(max_tags).collect(),
    }
}

fn string_items(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labels_and_tags_object() {
        let outcome = parse_suggestions(
            r#"{"labels": ["Tech", " "], "tags": ["rust", 3, "async "]}"#,
            5,
        );
        assert_eq!(
            outcome,
            SuggestionOutcome::Structured {
                labels: vec!["Tech".into()],
                tags: vec!["rust".into(), "async".into()],
            }
        );
    }

    #[test]
    fn tags_only_object_has_no_labels() {
        let outcome = parse_suggestions(r#"{"tags": ["a"]}"#, 5);
        assert_eq!(
            outcome,
            SuggestionOutcome::Structured {
                labels: vec![],
                tags: vec!["a".into()],
            }
        );
    }

    #[test]
    fn bare_array_is_tags() {
        let outcome = parse_suggestions(r#"["machine_learning", "technology"]"#, 5);
        assert_eq!(
            outcome,
            SuggestionOutcome::Structured {
                labels: vec![],
                tags: vec!["machine_learning".into(), "technology".into()],
            }
        );
    }

    #[test]
    fn fenced_json_is_accepted() {
        let outcome = parse_suggestions("```json\n{\"tags\": [\"x\"]}\n```", 5);
        assert!(matches!(outcome, SuggestionOutcome::Structured { ref tags, .. } if tags == &["x"]));
    }

    #[test]
    fn comma_list_falls_back_and_is_capped() {
        let outcome = parse_suggestions("economy, trade , , tariffs, china", 3);
        assert_eq!(
            outcome,
            SuggestionOutcome::FreeTextFallback {
                candidates: vec!["economy".into(), "trade".into(), "tariffs".into()],
            }
        );
        assert!(outcome.is_fallback());
    }

    #[test]
    fn long_free_text_is_unparseable() {
        let text = "a, b, c, d, e, f, g";
        assert_eq!(parse_suggestions(text, 2), SuggestionOutcome::Unparseable);
    }

    #[test]
    fn json_of_other_shape_is_unparseable() {
        assert_eq!(parse_suggestions(r#"{"topics": ["x"]}"#, 5), SuggestionOutcome::Unparseable);
        assert_eq!(parse_suggestions("42", 5), SuggestionOutcome::Unparseable);
        assert_eq!(parse_suggestions("   ", 5), SuggestionOutcome::Unparseable);
    }
}
