//! Google Generative Language API provider

use std::sync::Arc;

use async_trait::async_trait;
use chorus_config::ProviderConfig;
use secrecy::ExposeSecret;

use super::{Completion, HttpEndpoint, Provider};
use crate::context::InvokeContext;
use crate::credentials::CredentialSource;
use crate::error::ProviderError;
use crate::protocol::google::{GenerateContentRequest, GenerateContentResponse};

/// Default Google Generative Language API base URL
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Generative Language API provider
pub struct GoogleProvider {
    endpoint: HttpEndpoint,
}

impl GoogleProvider {
    pub fn new(
        id: &str,
        config: &ProviderConfig,
        credentials: Arc<dyn CredentialSource>,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            endpoint: HttpEndpoint::new(id, config, DEFAULT_BASE_URL, credentials)?,
        })
    }

    fn generate_path(&self) -> String {
        format!("models/{}:generateContent", self.endpoint.model)
    }
}

#[async_trait]
impl Provider for GoogleProvider {
    fn id(&self) -> &str {
        &self.endpoint.id
    }

    fn confidence(&self) -> u8 {
        self.endpoint.confidence
    }

    async fn complete(&self, text: &str, _ctx: &InvokeContext) -> Result<Completion, ProviderError> {
        let api_key = self.endpoint.credential()?;
        let wire_request = GenerateContentRequest::user(text, self.endpoint.max_tokens);

        let builder = self
            .endpoint
            .post(&self.generate_path())
            .header("x-goog-api-key", api_key.expose_secret())
            .json(&wire_request);

        let wire_response: GenerateContentResponse = self.endpoint.send(builder).await?;

        let content = wire_response
            .text()
            .ok_or_else(|| ProviderError::Malformed("response contained no candidate text".to_owned()))?;

        Ok(Completion {
            content,
            tokens_used: wire_response.total_tokens(),
        })
    }
}
