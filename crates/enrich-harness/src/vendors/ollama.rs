//! Ollama and other newline-delimited JSON providers.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::content::{ChatMessage, ChatRequest, ResponseFormat};
use crate::errors::{HarnessError, ProviderError};
use crate::ingest::{NdjsonDecoder, delta_stream, envelope_content};
use crate::model::{ProviderKind, RunOptions};
use crate::provider::{ProviderAdapter, ProviderStreamHandle};
use crate::vendors::http::HttpEndpoint;

/// Default local Ollama generate endpoint.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434/api/generate";

/// Provider adapter for Ollama-style endpoints.
///
/// The request carries the chat fields plus Ollama's `prompt`/`system`
/// pair so both `/api/generate` and chat-style servers understand it.
/// Streamed bodies are decoded as NDJSON.
pub struct OllamaProvider {
    kind: ProviderKind,
    endpoint: HttpEndpoint,
}

impl OllamaProvider {
    /// Creates a provider for `url`. `api_key` is optional; blank keys send
    /// no `Authorization` header.
    pub fn new(
        kind: ProviderKind,
        url: &str,
        api_key: Option<String>,
        options: &RunOptions,
    ) -> Result<Self, HarnessError> {
        let url = if url.trim().is_empty() {
            DEFAULT_OLLAMA_URL
        } else {
            url
        };
        let endpoint = HttpEndpoint::new(kind.clone(), url, api_key, options)?;
        Ok(Self { kind, endpoint })
    }

    /// A keyless provider for the local default endpoint.
    pub fn local() -> Result<Self, HarnessError> {
        Self::new(
            ProviderKind::Ollama,
            DEFAULT_OLLAMA_URL,
            None,
            &RunOptions::default(),
        )
    }
}

#[derive(Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<&'a ResponseFormat>,
    stream: bool,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
}

impl<'a> GenerateBody<'a> {
    fn from_request(request: &'a ChatRequest, stream: bool) -> Self {
        Self {
            model: &request.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            response_format: request.response_format.as_ref(),
            stream,
            prompt: request.user_prompt(),
            system: request.system_prompt(),
            format: request.response_format.as_ref().map(|_| "json"),
        }
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for OllamaProvider {
    fn kind(&self) -> ProviderKind {
        self.kind.clone()
    }

    async fn start_stream(
        &self,
        request: ChatRequest,
    ) -> Result<ProviderStreamHandle, ProviderError> {
        debug!(provider = %self.kind, model = %request.model, url = %self.endpoint.url(), "starting NDJSON completion stream");
        let body = GenerateBody::from_request(&request, true);
        let response = self.endpoint.post_json(&body).await?;
        let stream = delta_stream(
            self.kind.clone(),
            response.bytes_stream(),
            Box::new(NdjsonDecoder::default()),
        );
        Ok(ProviderStreamHandle::new(stream))
    }

    async fn complete(&self, request: ChatRequest) -> Result<String, ProviderError> {
        let body = GenerateBody::from_request(&request, false);
        let value = self.endpoint.post_for_json(&body).await?;
        generated_text(&self.kind, &value)
    }
}

/// Text of a non-streamed response: `response`, then `message.content`,
/// then `choices[0].message.content`.
fn generated_text(kind: &ProviderKind, value: &Value) -> Result<String, ProviderError> {
    if let Some(message) = value.get("error").and_then(Value::as_str) {
        return Err(ProviderError::validation(kind.clone(), message));
    }
    value
        .get("response")
        .and_then(Value::as_str)
        .or_else(|| {
            value
                .get("message")
                .and_then(|message| message.get("content"))
                .and_then(Value::as_str)
        })
        .or_else(|| envelope_content(value))
        .map(str::to_string)
        .ok_or_else(|| ProviderError::validation(kind.clone(), "response is missing generated text"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_carries_prompt_and_system() {
        let request = ChatRequest::new("llama3")
            .system("sys")
            .user("summarize this")
            .max_tokens(150)
            .response_format(ResponseFormat::json_object());
        let body = serde_json::to_value(GenerateBody::from_request(&request, true)).expect("json");
        assert_eq!(body["model"], "llama3");
        assert_eq!(body["prompt"], "summarize this");
        assert_eq!(body["system"], "sys");
        assert_eq!(body["stream"], true);
        assert_eq!(body["format"], "json");
        assert_eq!(body["messages"][1]["role"], "user");
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn generated_text_tries_known_shapes() {
        let kind = ProviderKind::Ollama;
        let generate = serde_json::json!({"response": "a", "done": true});
        let chat = serde_json::json!({"message": {"content": "b"}});
        let openai = serde_json::json!({"choices": [{"message": {"content": "c"}}]});
        assert_eq!(generated_text(&kind, &generate).expect("a"), "a");
        assert_eq!(generated_text(&kind, &chat).expect("b"), "b");
        assert_eq!(generated_text(&kind, &openai).expect("c"), "c");
        assert!(generated_text(&kind, &serde_json::json!({"error": "no model"})).is_err());
        assert!(generated_text(&kind, &serde_json::json!({})).is_err());
    }

    #[test]
    fn blank_url_uses_local_default() {
        let provider = OllamaProvider::new(ProviderKind::Ollama, " ", None, &RunOptions::default())
            .expect("provider");
        assert_eq!(provider.endpoint.url().as_str(), DEFAULT_OLLAMA_URL);
    }
}
