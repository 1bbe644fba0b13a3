//! Builds model requests from article content and host settings.

use enrich_core::{Label, char_len, normalize, truncate};
use enrich_harness::{ChatRequest, ResponseFormat};
use tracing::debug;

use crate::host::{ArticleRecord, RequestParameters};
use crate::markdown::escape_html;

pub const SUMMARY_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that provides concise summaries.";

pub const TAGGING_SYSTEM_PROMPT: &str = "You are an expert at analyzing text and suggesting relevant labels and tags for articles in a news aggregator. Your goal is to provide concise and accurate categorization.";

const TAGGING_TEMPERATURE: f32 = 0.3;

/// Article text as it will be sent: normalized, then truncated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedText {
    pub text: String,
    /// Length of the normalized text before truncation, in characters.
    pub normalized_len: usize,
}

pub fn prepare_text(content: &str, params: &RequestParameters) -> PreparedText {
    let normalized = normalize(content);
    let normalized_len = char_len(&normalized);
    let text = truncate(&normalized, &params.truncation_policy);
    debug!(
        event = "prompt.text_prepared",
        domain = "prompt",
        normalized_len = normalized_len as u64,
        sent_len = char_len(&text) as u64
    );
    PreparedText {
        text,
        normalized_len,
    }
}

/// Whether the normalized article is long enough to be worth a request.
pub fn meets_min_length(prepared: &PreparedText, params: &RequestParameters) -> bool {
    params.min_article_length == 0 || prepared.normalized_len >= params.min_article_length
}

/// Summary request: the template, the quoted title if any, then the text.
pub fn summary_request(
    article: &ArticleRecord,
    prepared: &PreparedText,
    params: &RequestParameters,
) -> ChatRequest {
    let mut body = params.prompt_template.trim().to_string();
    let title = article.title.trim();
    if !title.is_empty() {
        body.push_str(&format!(
            " The title of the article is \"{}\".",
            escape_html(title)
        ));
    }
    body.push_str("\n\nArticle content:\n\n");
    body.push_str(&prepared.text);

    let mut request = ChatRequest::new(params.model.clone())
        .system(SUMMARY_SYSTEM_PROMPT)
        .user(body)
        .max_tokens(params.max_tokens);
    if let Some(temperature) = params.temperature {
        request = request.temperature(temperature);
    }
    request
}

/// Tagging request asking for a `{labels, tags}` JSON object.
pub fn tagging_request(
    article: &ArticleRecord,
    prepared: &PreparedText,
    params: &RequestParameters,
) -> ChatRequest {
    let max_tags = params.max_tags;
    let existing = existing_labels_json(&article.owner_labels);

    let mut body = format!(
        "Analyze the following article content (and title, if provided) and suggest both labels and tags. The suggestions should be in {}.\n",
        params.label_language
    );
    body.push_str(&format!(
        "Here is a list of existing labels in the system. Prioritize using these if they are highly relevant, but also suggest new labels if appropriate: {existing}\n"
    ));
    let title = article.title.trim();
    if !title.is_empty() {
        body.push_str(&format!("Article Title: \"{}\"\n", escape_html(title)));
    }
    body.push_str(&format!("Article Content:\n\"{}\"\n\n", prepared.text));
    body.push_str("Respond with a JSON object containing two keys:\n");
    body.push_str(&format!(
        "1. \"labels\" - an array of up to {max_tags} colored labels (broad categories, topics, themes)\n"
    ));
    body.push_str(&format!(
        "2. \"tags\" - an array of up to {max_tags} specific tags (keywords, entities, specific topics)\n"
    ));
    body.push_str("Labels should be more general categorizations, while tags should be more specific to the article content. ");
    body.push_str("If no suitable labels or tags are found, return empty arrays. Do not include explanations or apologies in your response, only the JSON object.");

    ChatRequest::new(params.model.clone())
        .system(TAGGING_SYSTEM_PROMPT)
        .user(body)
        .response_format(ResponseFormat::json_object())
        .temperature(params.temperature.unwrap_or(TAGGING_TEMPERATURE))
        .max_tokens(tagging_max_tokens(max_tags))
}

/// Token budget for a tag list plus JSON overhead.
pub fn tagging_max_tokens(max_tags: usize) -> u32 {
    u32::try_from(max_tags)
        .unwrap_or(u32::MAX)
        .saturating_mul(10)
        .saturating_add(50)
}

fn existing_labels_json(labels: &[Label]) -> String {
    let captions: Vec<&str> = labels.iter().map(|label| label.caption.as_str()).collect();
    serde_json::to_string(&captions).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use enrich_core::{ColorPair, HexColor, TruncationPolicy};

    fn article(title: &str, content: &str) -> ArticleRecord {
        ArticleRecord {
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    #[test]
    fn prepares_normalized_truncated_text() {
        let params = RequestParameters {
            truncation_policy: TruncationPolicy::new(5, 2, 2, 100),
            ..RequestParameters::summary()
        };
        let prepared = prepare_text("<p>0123</p><p>456789</p>", &params);
        assert_eq!(prepared.normalized_len, 11);
        assert_eq!(prepared.text, "01\n...\n89");
    }

    #[test]
    fn min_length_gate() {
        let params = RequestParameters {
            min_article_length: 5,
            ..RequestParameters::summary()
        };
        assert!(!meets_min_length(&prepare_text("abc", &params), &params));
        assert!(meets_min_length(&prepare_text("abcdef", &params), &params));
        let disabled = RequestParameters {
            min_article_length: 0,
            ..params
        };
        assert!(meets_min_length(&prepare_text("", &disabled), &disabled));
    }

    #[test]
    fn summary_prompt_layout() {
        let params = RequestParameters {
            prompt_template: "Summarize.".into(),
            ..RequestParameters::summary()
        };
        let record = article("A & B", "body");
        let prepared = prepare_text(&record.content, &params);
        let request = summary_request(&record, &prepared, &params);
        assert_eq!(request.system_prompt().as_deref(), Some(SUMMARY_SYSTEM_PROMPT));
        assert_eq!(
            request.user_prompt(),
            "Summarize. The title of the article is \"A &amp; B\".\n\nArticle content:\n\nbody"
        );
        assert_eq!(request.max_tokens, 150);
        assert_eq!(request.temperature, None);
        assert_eq!(request.response_format, None);
    }

    #[test]
    fn tagging_prompt_lists_existing_labels_and_asks_for_json() {
        let mut record = article("", "text");
        record.owner_labels = vec![Label::new(
            "Science",
            ColorPair::for_background(HexColor::new(0x33, 0x33, 0x99)),
        )];
        let params = RequestParameters {
            max_tags: 3,
            label_language: "German".into(),
            ..RequestParameters::tagging()
        };
        let prepared = prepare_text(&record.content, &params);
        let request = tagging_request(&record, &prepared, &params);
        let body = request.user_prompt();
        assert!(body.contains("should be in German"));
        assert!(body.contains(r#"["Science"]"#));
        assert!(body.contains("up to 3 colored labels"));
        assert!(!body.contains("Article Title"));
        assert_eq!(request.response_format, Some(ResponseFormat::json_object()));
        assert_eq!(request.temperature, Some(0.3));
        assert_eq!(request.max_tokens, 80);
    }
}
