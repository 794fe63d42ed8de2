//! OpenAI chat completions wire format types

use serde::{Deserialize, Serialize};

// -- Request types --

/// Chat completion request
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Single chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    /// Content, null on some tool-call replies
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionRequest {
    /// Single-turn user request
    pub fn user(model: &str, text: &str, max_tokens: Option<u32>) -> Self {
        Self {
            model: model.to_owned(),
            messages: vec![ChatMessage {
                role: "user".to_owned(),
                content: Some(text.to_owned()),
            }],
            max_tokens,
        }
    }
}

// -- Response types --

/// Chat completion response
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<ChatUsage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

/// Token accounting reported by the API
///
/// Some compatible servers omit `total_tokens` and report only the parts.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChatUsage {
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
    pub total_tokens: Option<u64>,
}

impl ChatUsage {
    /// Reported total, or the sum of whichever parts are present
    pub fn total(&self) -> Option<u64> {
        self.total_tokens.or_else(|| match (self.prompt_tokens, self.completion_tokens) {
            (None, None) => None,
            (prompt, completion) => Some(prompt.unwrap_or(0).saturating_add(completion.unwrap_or(0))),
        })
    }
}

impl ChatCompletionResponse {
    /// Text of the first choice, if non-empty
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|s| !s.trim().is_empty())
    }

    pub fn total_tokens(&self) -> Option<u64> {
        self.usage.as_ref().and_then(ChatUsage::total)
    }
}
