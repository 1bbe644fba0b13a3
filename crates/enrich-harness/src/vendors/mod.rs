//! Vendor-specific integrations.

mod http;
pub mod ollama;
pub mod openai;

use std::sync::Arc;

use crate::errors::HarnessError;
use crate::model::{ProviderKind, RunOptions};
use crate::provider::ProviderAdapter;

use ollama::OllamaProvider;
use openai::{OpenAiClientConfig, OpenAiProvider};

/// Builds the adapter for `kind` from per-request settings.
///
/// OpenAI requires a non-empty `api_key`; every other kind treats it as
/// optional. Configuration errors are returned before any network call.
pub fn build_provider(
    kind: &ProviderKind,
    endpoint_url: &str,
    api_key: &str,
    options: RunOptions,
) -> Result<Arc<dyn ProviderAdapter>, HarnessError> {
    match kind {
        ProviderKind::OpenAi => {
            let mut config = OpenAiClientConfig::new(api_key).options(options);
            if !endpoint_url.trim().is_empty() {
                config = config.endpoint_url(endpoint_url);
            }
            Ok(Arc::new(OpenAiProvider::new(config)?))
        }
        ProviderKind::Ollama | ProviderKind::Other(_) => Ok(Arc::new(OllamaProvider::new(
            kind.clone(),
            endpoint_url,
            Some(api_key.to_string()),
            &options,
        )?)),
    }
}
