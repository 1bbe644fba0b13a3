//! Request settings for the demo, read from the environment.

use enrich_blocks::{RequestKind, RequestParameters};
use enrich_harness::ProviderKind;

/// Load .env from the examples crate dir, then the current dir.
pub fn load_env() {
    if let Ok(canon) = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join(".env")
        .canonicalize()
    {
        let _ = dotenvy::from_path(canon);
    }
    let _ = dotenvy::dotenv();
}

/// Provider settings shared by summary and tagging requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub provider: Option<String>,
    pub endpoint_url: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub label_language: Option<String>,
    pub max_tags: Option<usize>,
    pub min_article_length: Option<usize>,
}

impl Settings {
    /// Reads `ENRICH_PROVIDER`, `ENRICH_ENDPOINT_URL`, `OPENAI_API_KEY`
    /// (or `ENRICH_API_KEY`), `ENRICH_MODEL`, `ENRICH_LABEL_LANGUAGE`,
    /// `ENRICH_MAX_TAGS` and `ENRICH_MIN_ARTICLE_LENGTH`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            provider: get("ENRICH_PROVIDER"),
            endpoint_url: get("ENRICH_ENDPOINT_URL"),
            api_key: get("ENRICH_API_KEY").or_else(|| get("OPENAI_API_KEY")),
            model: get("ENRICH_MODEL"),
            label_language: get("ENRICH_LABEL_LANGUAGE"),
            max_tags: get("ENRICH_MAX_TAGS").and_then(|v| v.trim().parse().ok()),
            min_article_length: get("ENRICH_MIN_ARTICLE_LENGTH")
                .and_then(|v| v.trim().parse().ok()),
        }
    }

    /// Settings for `kind`, starting from that kind's defaults.
    pub fn parameters(&self, kind: RequestKind) -> RequestParameters {
        let mut params = RequestParameters::for_kind(kind);
        if let Some(provider) = &self.provider {
            params.provider_kind = ProviderKind::parse(provider);
        }
        if let Some(url) = &self.endpoint_url {
            params.endpoint_url = url.trim().to_string();
        }
        if let Some(key) = &self.api_key {
            params.api_key = key.trim().to_string();
        }
        if let Some(model) = &self.model {
            params.model = model.trim().to_string();
        }
        if let Some(language) = &self.label_language {
            params.label_language = language.trim().to_string();
        }
        if let Some(max_tags) = self.max_tags {
            params.max_tags = max_tags;
        }
        if let Some(min) = self.min_article_length {
            params.min_article_length = min;
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Settings {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn empty_env_keeps_defaults() {
        let params = settings(&[]).parameters(RequestKind::Tagging);
        assert_eq!(params, RequestParameters::tagging());
    }

    #[test]
    fn env_overrides_provider_and_model() {
        let s = settings(&[
            ("ENRICH_PROVIDER", "Ollama"),
            ("ENRICH_ENDPOINT_URL", "http://gpu-box:11434/api/generate"),
            ("ENRICH_MODEL", "llama3.1"),
            ("OPENAI_API_KEY", "sk-test"),
            ("ENRICH_MAX_TAGS", "3"),
            ("ENRICH_MIN_ARTICLE_LENGTH", "oops"),
        ]);
        let params = s.parameters(RequestKind::Summary);
        assert_eq!(params.provider_kind, ProviderKind::Ollama);
        assert_eq!(params.endpoint_url, "http://gpu-box:11434/api/generate");
        assert_eq!(params.model, "llama3.1");
        assert_eq!(params.api_key, "sk-test");
        assert_eq!(params.max_tags, 3);
        assert_eq!(params.min_article_length, 200);
    }

    #[test]
    fn enrich_api_key_wins_over_openai_key() {
        let s = settings(&[("ENRICH_API_KEY", "k1"), ("OPENAI_API_KEY", "k2")]);
        assert_eq!(s.api_key.as_deref(), Some("k1"));
        let blank = settings(&[("ENRICH_API_KEY", "  "), ("OPENAI_API_KEY", "k2")]);
        assert_eq!(blank.api_key.as_deref(), Some("k2"));
    }
}
