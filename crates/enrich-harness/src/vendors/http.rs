use serde::Serialize;
use tracing::{debug, warn};

use crate::errors::{HarnessError, ProviderError};
use crate::model::{ProviderKind, RunOptions};

/// A configured POST target shared by the vendor adapters.
pub(crate) struct HttpEndpoint {
    provider: ProviderKind,
    client: reqwest::Client,
    url: reqwest::Url,
    api_key: Option<String>,
}

impl HttpEndpoint {
    pub(crate) fn new(
        provider: ProviderKind,
        url: &str,
        api_key: Option<String>,
        options: &RunOptions,
    ) -> Result<Self, HarnessError> {
        let url = reqwest::Url::parse(url.trim()).map_err(|e| {
            HarnessError::Config(format!("invalid {provider} endpoint url {url:?}: {e}"))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(HarnessError::Config(format!(
                "{provider} endpoint url must use http or https: {url}"
            )));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(options.connect_timeout)
            .timeout(options.timeout)
            .build()
            .map_err(|e| HarnessError::Config(format!("failed to build {provider} client: {e}")))?;
        Ok(Self {
            provider,
            client,
            url,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    pub(crate) fn url(&self) -> &reqwest::Url {
        &self.url
    }

    /// Posts `body` as JSON and returns the response if the status is 2xx.
    pub(crate) async fn post_json<B: Serialize + ?Sized>(
        &self,
        body: &B,
    ) -> Result<reqwest::Response, ProviderError> {
        debug!(
            event = "http.request",
            domain = "harness",
            provider = %self.provider,
            url = %self.url
        );
        let mut request = self.client.post(self.url.clone()).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            ProviderError::transport(
                self.provider.clone(),
                format!("request to {} failed: {e}", self.url),
                None,
            )
        })?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            warn!(
                event = "http.status",
                domain = "harness",
                provider = %self.provider,
                status = status.as_u16(),
                "provider returned an error status"
            );
            return Err(ProviderError::transport(
                self.provider.clone(),
                format!("request failed with status {status}: {body}"),
                Some(status.as_u16()),
            ));
        }
        Ok(response)
    }

    /// Posts `body` and parses the whole response as JSON.
    pub(crate) async fn post_for_json<B: Serialize + ?Sized>(
        &self,
        body: &B,
    ) -> Result<serde_json::Value, ProviderError> {
        let response = self.post_json(body).await?;
        let bytes = response.bytes().await.map_err(|e| {
            ProviderError::transport(
                self.provider.clone(),
                format!("failed to read response body: {e}"),
                None,
            )
        })?;
        serde_json::from_slice(&bytes).map_err(|e| {
            ProviderError::decode(self.provider.clone(), format!("invalid response JSON: {e}"))
        })
    }
}
