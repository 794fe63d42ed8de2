//! Provider trait and HTTP adapters

pub mod anthropic;
pub mod google;
pub mod openai;

use std::sync::Arc;

use async_trait::async_trait;
use chorus_config::{ProviderConfig, ProviderType};
use chorus_core::{ProviderFailure, ProviderOutcome, ProviderSuccess};
use indexmap::IndexMap;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, RequestBuilder};
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use tokio::time::Instant;
use url::Url;

pub use self::anthropic::AnthropicProvider;
pub use self::google::GoogleProvider;
pub use self::openai::OpenAiProvider;
use crate::context::InvokeContext;
use crate::credentials::CredentialSource;
use crate::error::ProviderError;
use crate::tokens;

/// Raw reply from a provider before it becomes an outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub content: String,
    /// Usage reported upstream; estimated locally when absent
    pub tokens_used: Option<u64>,
}

/// One external text-generation service
#[async_trait]
pub trait Provider: Send + Sync {
    /// Configured provider id
    fn id(&self) -> &str;

    /// Opaque confidence attached to every answer, 0 to 100
    fn confidence(&self) -> u8;

    /// Send the request text upstream
    async fn complete(&self, text: &str, ctx: &InvokeContext) -> Result<Completion, ProviderError>;

    /// Run [`complete`](Self::complete) inside the context's bounds
    ///
    /// Always resolves by the deadline or on cancellation, whichever comes
    /// first, and never returns anything but an outcome.
    async fn invoke(&self, text: &str, ctx: &InvokeContext) -> ProviderOutcome {
        let started = Instant::now();

        let completed = tokio::select! {
            biased;
            () = ctx.cancel.cancelled() => Err(ProviderError::Cancelled),
            completed = tokio::time::timeout_at(ctx.deadline, self.complete(text, ctx)) => {
                completed.unwrap_or(Err(ProviderError::Timeout))
            }
        };

        let result = completed.and_then(|completion| {
            if completion.content.trim().is_empty() {
                Err(ProviderError::Malformed("provider returned empty content".to_owned()))
            } else {
                Ok(completion)
            }
        });

        let latency = started.elapsed();

        match result {
            Ok(completion) => {
                let tokens_used = completion
                    .tokens_used
                    .unwrap_or_else(|| tokens::estimate_exchange(text, &completion.content));

                tracing::debug!(provider = %self.id(), ?latency, tokens_used, "provider answered");

                ProviderOutcome::Success(ProviderSuccess {
                    provider_id: self.id().to_owned(),
                    content: completion.content,
                    confidence: self.confidence().min(100),
                    tokens_used,
                    latency,
                })
            }
            Err(e) => {
                let reason = e.kind();
                tracing::warn!(provider = %self.id(), %reason, ?latency, error = %e, "provider call failed");

                ProviderOutcome::Failure(ProviderFailure {
                    provider_id: self.id().to_owned(),
                    reason,
                    message: e.to_string(),
                    latency,
                    tokens_used: 0,
                })
            }
        }
    }
}

/// Construct one adapter per configured provider, in configuration order
pub fn build_providers(
    providers: &IndexMap<String, ProviderConfig>,
    credentials: &Arc<dyn CredentialSource>,
) -> Result<Vec<Arc<dyn Provider>>, ProviderError> {
    providers
        .iter()
        .map(|(id, config)| {
            let provider: Arc<dyn Provider> = match config.provider_type {
                ProviderType::Openai => Arc::new(OpenAiProvider::new(id, config, Arc::clone(credentials))?),
                ProviderType::Anthropic => Arc::new(AnthropicProvider::new(id, config, Arc::clone(credentials))?),
                ProviderType::Google => Arc::new(GoogleProvider::new(id, config, Arc::clone(credentials))?),
            };
            tracing::debug!(provider = %id, kind = ?config.provider_type, model = %config.model, "provider adapter ready");
            Ok(provider)
        })
        .collect()
}

/// Connection settings shared by the HTTP adapters
pub(crate) struct HttpEndpoint {
    pub(crate) id: String,
    pub(crate) model: String,
    pub(crate) confidence: u8,
    pub(crate) max_tokens: Option<u32>,
    base_url: Url,
    client: Client,
    credentials: Arc<dyn CredentialSource>,
}

impl HttpEndpoint {
    pub(crate) fn new(
        id: &str,
        config: &ProviderConfig,
        default_base_url: &str,
        credentials: Arc<dyn CredentialSource>,
    ) -> Result<Self, ProviderError> {
        let base_url = match &config.base_url {
            Some(url) => url.clone(),
            None => Url::parse(default_base_url).map_err(|e| ProviderError::Config(e.to_string()))?,
        };

        let client = Client::builder()
            .build()
            .map_err(|e| ProviderError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            id: id.to_owned(),
            model: config.model.clone(),
            confidence: config.confidence,
            max_tokens: config.max_tokens,
            base_url,
            client,
            credentials,
        })
    }

    /// Credential resolved right before the call
    pub(crate) fn credential(&self) -> Result<SecretString, ProviderError> {
        self.credentials
            .credential(&self.id)
            .ok_or_else(|| ProviderError::MissingCredential {
                provider: self.id.clone(),
            })
    }

    /// Join a path onto the configured base URL
    pub(crate) fn url(&self, path: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/{}", path.trim_start_matches('/'))
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }

    /// Send a request and decode a JSON success body
    pub(crate) async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ProviderError> {
        let response = builder.send().await.map_err(|e| {
            tracing::error!(provider = %self.id, error = %e, "upstream request failed");
            ProviderError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);
            let body = response.text().await.unwrap_or_default();

            tracing::warn!(provider = %self.id, %status, "upstream returned error");

            return Err(ProviderError::from_status(status, retry_after, &body));
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ProviderError::Malformed(format!("failed to parse response: {e}")))
    }
}
