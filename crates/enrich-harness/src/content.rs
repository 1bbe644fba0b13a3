use crate::errors::HarnessError;

/// Author of a chat message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Requested output framing (`{"type": "json_object"}` asks for JSON).
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: String,
}

impl ResponseFormat {
    pub fn json_object() -> Self {
        Self {
            kind: "json_object".to_string(),
        }
    }
}

/// A chat-completions request body.
///
/// Serializes to `{ model, messages, max_tokens, temperature?,
/// response_format?, stream? }`; unset optional fields are omitted.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            max_tokens: 150,
            temperature: None,
            response_format: None,
            stream: None,
        }
    }

    /// Appends a system message.
    pub fn system(mut self, text: impl Into<String>) -> Self {
        self.messages.push(ChatMessage::new(Role::System, text));
        self
    }

    /// Appends a user message.
    pub fn user(mut self, text: impl Into<String>) -> Self {
        self.messages.push(ChatMessage::new(Role::User, text));
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }

    /// Marks the request as streamed. Adapters decide whether the flag is
    /// forwarded; OpenAI-compatible bodies never carry it.
    pub fn streaming(mut self, stream: bool) -> Self {
        self.stream = Some(stream);
        self
    }

    pub fn is_streaming(&self) -> bool {
        self.stream.unwrap_or(false)
    }

    /// Concatenated user messages, used by completion-style endpoints that
    /// take a single prompt.
    pub fn user_prompt(&self) -> String {
        self.messages
            .iter()
            .filter(|message| message.role == Role::User)
            .map(|message| message.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Joined system messages, if any.
    pub fn system_prompt(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .messages
            .iter()
            .filter(|message| message.role == Role::System)
            .map(|message| message.content.trim())
            .filter(|content| !content.is_empty())
            .collect();
        (!parts.is_empty()).then(|| parts.join("\n\n"))
    }

    /// Checks the request before anything is sent.
    pub fn validate(&self) -> Result<(), HarnessError> {
        if self.model.trim().is_empty() {
            return Err(HarnessError::Validation("model must not be empty".into()));
        }
        if self.max_tokens == 0 {
            return Err(HarnessError::Validation(
                "max_tokens must be greater than 0".into(),
            ));
        }
        let has_user_text = self
            .messages
            .iter()
            .any(|message| message.role == Role::User && !message.content.trim().is_empty());
        if !has_user_text {
            return Err(HarnessError::Validation(
                "at least one non-empty user message is required".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_optional_fields_only_when_set() {
        let plain = ChatRequest::new("gpt-4.1-nano").user("hi").max_tokens(20);
        let value = serde_json::to_value(&plain).expect("json");
        assert_eq!(
            value,
            serde_json::json!({
                "model": "gpt-4.1-nano",
                "messages": [{"role": "user", "content": "hi"}],
                "max_tokens": 20
            })
        );

        let tagged = plain
            .temperature(0.5)
            .response_format(ResponseFormat::json_object())
            .streaming(true);
        let value = serde_json::to_value(&tagged).expect("json");
        assert_eq!(value["response_format"]["type"], "json_object");
        assert_eq!(value["stream"], true);
        assert_eq!(value["temperature"], 0.5);
    }

    #[test]
    fn validation_rejects_missing_user_text() {
        let err = ChatRequest::new("m").system("sys").user("   ").validate();
        assert!(matches!(err, Err(HarnessError::Validation(msg)) if msg.contains("user message")));
        assert!(ChatRequest::new(" ").user("x").validate().is_err());
        assert!(ChatRequest::new("m").user("x").max_tokens(0).validate().is_err());
        assert!(ChatRequest::new("m").user("x").validate().is_ok());
    }

    #[test]
    fn prompt_helpers_split_roles() {
        let request = ChatRequest::new("m").system("be brief").user("a").user("b");
        assert_eq!(request.system_prompt().as_deref(), Some("be brief"));
        assert_eq!(request.user_prompt(), "a\n\nb");
        assert_eq!(ChatRequest::new("m").user("a").system_prompt(), None);
    }
}
