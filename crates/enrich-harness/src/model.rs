use std::fmt;
use std::time::Duration;

/// Which backend a request is sent to.
///
/// Anything other than `openai` or `ollama` is treated as an
/// Ollama-compatible endpoint that streams newline-delimited JSON.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Ollama,
    Other(String),
}

impl ProviderKind {
    /// Parses a provider name case-insensitively. Blank input means OpenAI.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "" | "openai" => Self::OpenAi,
            "ollama" => Self::Ollama,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
            Self::Other(name) => name,
        }
    }

    /// How this provider frames a streamed response body.
    pub fn wire_format(&self) -> WireFormat {
        match self {
            Self::OpenAi => WireFormat::Envelope,
            Self::Ollama | Self::Other(_) => WireFormat::Ndjson,
        }
    }

    /// Whether requests must carry a bearer token.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::OpenAi)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ProviderKind {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl serde::Serialize for ProviderKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for ProviderKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::parse(&value))
    }
}

/// Framing of a streamed response body.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum WireFormat {
    /// Every transport chunk is one complete JSON envelope
    /// `{ "choices": [{ "message": { "content": ... } }] }`.
    Envelope,
    /// Newline-delimited JSON objects `{ "response": ... }`; lines may be
    /// split across chunks.
    Ndjson,
}

/// Transport behavior for one provider client.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RunOptions {
    /// Maximum time to establish the connection.
    pub connect_timeout: Duration,
    /// Maximum time for the whole request, including reading the body.
    pub timeout: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            timeout: Duration::from_secs(60),
        }
    }
}

impl RunOptions {
    pub fn from_secs(connect_timeout_secs: u64, timeout_secs: u64) -> Self {
        Self {
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_options_default_timeouts() {
        let options = RunOptions::default();
        assert_eq!(options.connect_timeout, Duration::from_secs(30));
        assert_eq!(options.timeout, Duration::from_secs(60));
    }

    #[test]
    fn provider_kind_selects_wire_format() {
        assert_eq!(ProviderKind::parse("OpenAI").wire_format(), WireFormat::Envelope);
        assert_eq!(ProviderKind::parse("ollama").wire_format(), WireFormat::Ndjson);
        assert_eq!(
            ProviderKind::parse(" lmstudio "),
            ProviderKind::Other("lmstudio".into())
        );
        assert_eq!(ProviderKind::parse("lmstudio").wire_format(), WireFormat::Ndjson);
        assert_eq!(ProviderKind::parse(""), ProviderKind::OpenAi);
    }

    #[test]
    fn provider_kind_serializes_as_name() {
        let json = serde_json::to_string(&ProviderKind::Ollama).expect("json");
        assert_eq!(json, "\"ollama\"");
        let back: ProviderKind = serde_json::from_str("\"OPENAI\"").expect("kind");
        assert_eq!(back, ProviderKind::OpenAi);
    }
}
