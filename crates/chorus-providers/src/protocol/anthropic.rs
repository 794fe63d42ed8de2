//! Anthropic Messages API wire format types

use serde::{Deserialize, Serialize};

// -- Request types --

/// Messages API request
#[derive(Debug, Clone, Serialize)]
pub struct MessagesRequest {
    pub model: String,
    /// Required by the API
    pub max_tokens: u32,
    pub messages: Vec<MessageParam>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageParam {
    pub role: String,
    pub content: String,
}

impl MessagesRequest {
    /// Single-turn user request
    pub fn user(model: &str, text: &str, max_tokens: u32) -> Self {
        Self {
            model: model.to_owned(),
            max_tokens,
            messages: vec![MessageParam {
                role: "user".to_owned(),
                content: text.to_owned(),
            }],
        }
    }
}

// -- Response types --

/// Messages API response
#[derive(Debug, Clone, Deserialize)]
pub struct MessagesResponse {
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub usage: Option<MessagesUsage>,
}

/// Response content block; only text blocks are read
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessagesUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

impl MessagesResponse {
    /// Concatenated text blocks, if any text was returned
    pub fn text(&self) -> Option<String> {
        let text: String = self
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::Other => None,
            })
            .collect();

        (!text.trim().is_empty()).then_some(text)
    }

    pub fn total_tokens(&self) -> Option<u64> {
        self.usage
            .as_ref()
            .map(|u| u.input_tokens.saturating_add(u.output_tokens))
    }
}
