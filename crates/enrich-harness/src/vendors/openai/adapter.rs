use tracing::debug;

use crate::content::ChatRequest;
use crate::errors::{HarnessError, ProviderError};
use crate::ingest::{EnvelopeDecoder, delta_stream, envelope_content};
use crate::model::ProviderKind;
use crate::provider::{ProviderAdapter, ProviderStreamHandle};
use crate::vendors::http::HttpEndpoint;

use super::config::OpenAiClientConfig;

/// Provider adapter for OpenAI-compatible chat completions.
///
/// Streamed bodies are read as whole JSON envelopes per chunk.
pub struct OpenAiProvider {
    endpoint: HttpEndpoint,
}

impl OpenAiProvider {
    /// Creates a provider from explicit client configuration.
    pub fn new(config: OpenAiClientConfig) -> Result<Self, HarnessError> {
        if config.api_key.trim().is_empty() {
            return Err(HarnessError::Config(
                "OpenAI client config api_key must not be empty".into(),
            ));
        }
        let endpoint = HttpEndpoint::new(
            ProviderKind::OpenAi,
            &config.chat_completions_url(),
            Some(config.api_key.clone()),
            &config.options,
        )?;
        Ok(Self { endpoint })
    }

    /// Creates a provider using `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self, HarnessError> {
        Self::new(OpenAiClientConfig::from_env()?)
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for OpenAiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    async fn start_stream(
        &self,
        request: ChatRequest,
    ) -> Result<ProviderStreamHandle, ProviderError> {
        debug!(model = %request.model, url = %self.endpoint.url(), "starting OpenAI completion stream");
        let response = self.endpoint.post_json(&wire_body(request)).await?;
        let stream = delta_stream(
            ProviderKind::OpenAi,
            response.bytes_stream(),
            Box::new(EnvelopeDecoder::default()),
        );
        Ok(ProviderStreamHandle::new(stream))
    }

    async fn complete(&self, request: ChatRequest) -> Result<String, ProviderError> {
        let value = self.endpoint.post_for_json(&wire_body(request)).await?;
        completion_text(&value)
    }
}

/// Body sent to the chat completions endpoint. Streamed replies are read as
/// whole JSON envelopes, so the `stream` flag is never forwarded.
fn wire_body(request: ChatRequest) -> ChatRequest {
    ChatRequest {
        stream: None,
        ..request
    }
}

/// Extracts `choices[0].message.content` from a whole response.
pub(crate) fn completion_text(value: &serde_json::Value) -> Result<String, ProviderError> {
    if let Some(message) = value
        .get("error")
        .and_then(|error| error.get("message"))
        .and_then(|message| message.as_str())
    {
        return Err(ProviderError::validation(ProviderKind::OpenAi, message));
    }
    envelope_content(value).map(str::to_string).ok_or_else(|| {
        ProviderError::validation(
            ProviderKind::OpenAi,
            "response is missing choices[0].message.content",
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_key_is_a_config_error() {
        let err = OpenAiProvider::new(OpenAiClientConfig::new("  ")).err().expect("error");
        assert!(matches!(err, HarnessError::Config(_)));
    }

    #[test]
    fn malformed_base_url_is_a_config_error() {
        let err = OpenAiProvider::new(OpenAiClientConfig::new("k").base_url("::nope"))
            .err()
            .expect("error");
        assert!(matches!(err, HarnessError::Config(_)));
    }

    #[test]
    fn wire_body_never_carries_stream_flag() {
        let request = ChatRequest::new("gpt-4.1-nano")
            .system("sys")
            .user("x")
            .max_tokens(150)
            .streaming(true);
        let body = serde_json::to_value(wire_body(request)).expect("json");
        assert!(body.get("stream").is_none());
        assert_eq!(
            body.as_object().map(|fields| fields.len()),
            Some(3),
            "expected only model, messages and max_tokens: {body}"
        );
    }

    #[test]
    fn extracts_single_shot_content() {
        let value = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "{\"tags\":[\"a\"]}"}}]
        });
        assert_eq!(completion_text(&value).expect("text"), "{\"tags\":[\"a\"]}");
    }

    #[test]
    fn missing_content_is_a_validation_error() {
        let err = completion_text(&serde_json::json!({"choices": []})).expect_err("missing");
        assert!(matches!(err, ProviderError::Validation { .. }));
        let err = completion_text(&serde_json::json!({"error": {"message": "bad key"}}))
            .expect_err("api error");
        assert_eq!(err.message(), "bad key");
    }

    #[tokio::test]
    async fn env_gated_smoke_complete_if_key_present() {
        if std::env::var("OPENAI_API_KEY")
            .unwrap_or_default()
            .trim()
            .is_empty()
        {
            eprintln!("skipping OpenAI smoke test (OPENAI_API_KEY missing)");
            return;
        }

        let provider = OpenAiProvider::from_env().expect("provider");
        let result = provider
            .complete(
                ChatRequest::new("gpt-4.1-nano")
                    .user("Return exactly the word: ok")
                    .max_tokens(20),
            )
            .await;
        assert!(result.is_ok(), "OpenAI smoke failed: {result:?}");
    }

    #[tokio::test]
    async fn env_gated_smoke_stream_reaches_terminal_if_key_present() {
        if std::env::var("OPENAI_API_KEY")
            .unwrap_or_default()
            .trim()
            .is_empty()
        {
            eprintln!("skipping OpenAI stream smoke test (OPENAI_API_KEY missing)");
            return;
        }

        let provider = OpenAiProvider::from_env().expect("provider");
        let mut run = crate::RunStream::start(
            &provider,
            ChatRequest::new("gpt-4.1-nano")
                .system("Reply with a short greeting.")
                .user("hello")
                .max_tokens(20),
        )
        .await
        .expect("start stream");

        let mut saw_terminal = false;
        while let Some(event) = run.next_event().await {
            if let crate::StreamEvent::Finished(_) = event {
                saw_terminal = true;
            }
        }
        assert!(saw_terminal, "expected terminal event");
    }
}
