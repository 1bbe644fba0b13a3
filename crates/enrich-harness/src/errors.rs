use crate::model::ProviderKind;

/// Errors returned by a provider adapter before they are normalized for the
/// public run stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// Connect failure, timeout, non-2xx status or a failed body read.
    #[error("transport error ({provider}): {message}")]
    Transport {
        provider: ProviderKind,
        message: String,
        status_code: Option<u16>,
    },
    /// A response envelope could not be decoded.
    #[error("decode error ({provider}): {message}")]
    Decode {
        provider: ProviderKind,
        message: String,
    },
    /// The response decoded but lacked a required field.
    #[error("validation error ({provider}): {message}")]
    Validation {
        provider: ProviderKind,
        message: String,
    },
}

impl ProviderError {
    /// Creates a transport-level error.
    pub fn transport(
        provider: impl Into<ProviderKind>,
        message: impl Into<String>,
        status_code: Option<u16>,
    ) -> Self {
        Self::Transport {
            provider: provider.into(),
            message: message.into(),
            status_code,
        }
    }

    /// Creates a decode error.
    pub fn decode(provider: impl Into<ProviderKind>, message: impl Into<String>) -> Self {
        Self::Decode {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(provider: impl Into<ProviderKind>, message: impl Into<String>) -> Self {
        Self::Validation {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Returns the provider associated with this error.
    pub fn provider(&self) -> &ProviderKind {
        match self {
            Self::Transport { provider, .. }
            | Self::Decode { provider, .. }
            | Self::Validation { provider, .. } => provider,
        }
    }

    /// Returns the human-readable message for this error.
    pub fn message(&self) -> &str {
        match self {
            Self::Transport { message, .. }
            | Self::Decode { message, .. }
            | Self::Validation { message, .. } => message,
        }
    }
}

/// Terminal run failure carried by `CompletionResult::Failed`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, serde::Serialize, serde::Deserialize)]
pub enum RunFailure {
    /// Network/stream transport failed.
    #[error("transport failure ({provider}): {message}")]
    Transport {
        provider: String,
        message: String,
        status_code: Option<u16>,
    },
    /// A response body could not be decoded.
    #[error("decode failure ({provider}): {message}")]
    Decode { provider: String, message: String },
    /// A required field was missing, or the request was rejected before it
    /// was sent.
    #[error("validation failure: {message}")]
    Validation { message: String },
}

impl RunFailure {
    /// Short text suitable for showing next to the article.
    ///
    /// Transport failures collapse to a generic message; the detailed
    /// message is only logged.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport { .. } => "Request failed".to_string(),
            Self::Decode { .. } => "Invalid response from the model provider".to_string(),
            Self::Validation { message } => message.clone(),
        }
    }
}

impl From<&ProviderError> for RunFailure {
    fn from(err: &ProviderError) -> Self {
        match err {
            ProviderError::Transport {
                provider,
                message,
                status_code,
            } => Self::Transport {
                provider: provider.to_string(),
                message: message.clone(),
                status_code: *status_code,
            },
            ProviderError::Decode { provider, message } => Self::Decode {
                provider: provider.to_string(),
                message: message.clone(),
            },
            ProviderError::Validation { provider, message } => Self::Validation {
                message: format!("provider={provider}: {message}"),
            },
        }
    }
}

/// Top-level error type for the public harness API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HarnessError {
    /// Invalid provider configuration (missing API key, malformed URL).
    #[error("config error: {0}")]
    Config(String),
    /// Invalid request built by the caller.
    #[error("validation error: {0}")]
    Validation(String),
    /// Provider failure before a stream was established, or from a
    /// single-shot completion.
    #[error(transparent)]
    Provider(ProviderError),
}

impl HarnessError {
    /// Message for display to an end user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(message) | Self::Validation(message) => message.clone(),
            Self::Provider(err) => RunFailure::from(err).user_message(),
        }
    }
}

impl From<ProviderError> for HarnessError {
    fn from(value: ProviderError) -> Self {
        HarnessError::Provider(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_failures_get_generic_user_message() {
        let err = ProviderError::transport(ProviderKind::OpenAi, "connect refused", None);
        let failure = RunFailure::from(&err);
        assert_eq!(failure.user_message(), "Request failed");
        assert!(failure.to_string().contains("connect refused"));
    }

    #[test]
    fn validation_failures_keep_their_message() {
        let failure = RunFailure::Validation {
            message: "Article content is too short to summarize".into(),
        };
        assert_eq!(
            failure.user_message(),
            "Article content is too short to summarize"
        );
    }

    #[test]
    fn provider_validation_maps_with_provider_prefix() {
        let err = ProviderError::validation(ProviderKind::Ollama, "missing response");
        assert_eq!(
            RunFailure::from(&err),
            RunFailure::Validation {
                message: "provider=ollama: missing response".into()
            }
        );
        assert_eq!(err.provider(), &ProviderKind::Ollama);
        assert_eq!(err.message(), "missing response");
    }
}
