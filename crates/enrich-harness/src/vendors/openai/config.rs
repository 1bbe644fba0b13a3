use crate::errors::HarnessError;
use crate::model::RunOptions;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Configuration for the OpenAI chat-completions client.
#[derive(Clone, Debug)]
pub struct OpenAiClientConfig {
    /// API key used for bearer auth.
    pub api_key: String,
    /// Base URL for the OpenAI-compatible endpoint.
    ///
    /// Useful for proxies or local test servers.
    pub base_url: String,
    /// Full endpoint URL. Takes precedence over `base_url` when set.
    pub endpoint_url: Option<String>,
    /// Connect and overall request timeouts.
    pub options: RunOptions,
}

impl OpenAiClientConfig {
    /// Creates a config with default URL and timeouts.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            endpoint_url: None,
            options: RunOptions::default(),
        }
    }

    /// Builds a config from `OPENAI_API_KEY` and optional `OPENAI_BASE_URL`.
    pub fn from_env() -> Result<Self, HarnessError> {
        let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        if api_key.trim().is_empty() {
            return Err(HarnessError::Config(
                "missing OPENAI_API_KEY for OpenAI provider".into(),
            ));
        }
        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL")
            && !base_url.trim().is_empty()
        {
            config.base_url = base_url.trim().to_string();
        }
        Ok(config)
    }

    /// Overrides the API base URL (for proxies or test servers).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Uses `url` as-is instead of deriving it from the base URL.
    pub fn endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = Some(url.into());
        self
    }

    pub fn options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub(crate) fn chat_completions_url(&self) -> String {
        match self.endpoint_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => format!("{}/chat/completions", self.base_url.trim_end_matches('/')),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_chat_completions_url_from_base() {
        let config = OpenAiClientConfig::new("k").base_url("http://proxy.local/v1/");
        assert_eq!(
            config.chat_completions_url(),
            "http://proxy.local/v1/chat/completions"
        );
    }

    #[test]
    fn explicit_endpoint_wins() {
        let config = OpenAiClientConfig::new("k").endpoint_url("https://example.test/chat");
        assert_eq!(config.chat_completions_url(), "https://example.test/chat");
    }
}
