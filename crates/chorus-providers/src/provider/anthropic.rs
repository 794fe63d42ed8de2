//! Anthropic Messages API provider

use std::sync::Arc;

use async_trait::async_trait;
use chorus_config::ProviderConfig;
use secrecy::ExposeSecret;

use super::{Completion, HttpEndpoint, Provider};
use crate::context::InvokeContext;
use crate::credentials::CredentialSource;
use crate::error::ProviderError;
use crate::protocol::anthropic::{MessagesRequest, MessagesResponse};

/// Default Anthropic API base URL
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";

/// Anthropic API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// `max_tokens` sent when none is configured; the API requires one
const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Anthropic Messages API provider
pub struct AnthropicProvider {
    endpoint: HttpEndpoint,
}

impl AnthropicProvider {
    pub fn new(
        id: &str,
        config: &ProviderConfig,
        credentials: Arc<dyn CredentialSource>,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            endpoint: HttpEndpoint::new(id, config, DEFAULT_BASE_URL, credentials)?,
        })
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn id(&self) -> &str {
        &self.endpoint.id
    }

    fn confidence(&self) -> u8 {
        self.endpoint.confidence
    }

    async fn complete(&self, text: &str, _ctx: &InvokeContext) -> Result<Completion, ProviderError> {
        let api_key = self.endpoint.credential()?;
        let wire_request = MessagesRequest::user(
            &self.endpoint.model,
            text,
            self.endpoint.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        );

        let builder = self
            .endpoint
            .post("messages")
            .header("x-api-key", api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&wire_request);

        let wire_response: MessagesResponse = self.endpoint.send(builder).await?;

        let content = wire_response
            .text()
            .ok_or_else(|| ProviderError::Malformed("response contained no text blocks".to_owned()))?;

        Ok(Completion {
            content,
            tokens_used: wire_response.total_tokens(),
        })
    }
}
