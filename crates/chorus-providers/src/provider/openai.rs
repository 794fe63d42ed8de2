//! OpenAI-compatible chat completions provider

use std::sync::Arc;

use async_trait::async_trait;
use chorus_config::ProviderConfig;
use secrecy::ExposeSecret;

use super::{Completion, HttpEndpoint, Provider};
use crate::context::InvokeContext;
use crate::credentials::CredentialSource;
use crate::error::ProviderError;
use crate::protocol::openai::{ChatCompletionRequest, ChatCompletionResponse};

/// Default `OpenAI` API base URL
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Provider speaking the `OpenAI` chat completions protocol
///
/// Works against any compatible endpoint through `base_url`.
pub struct OpenAiProvider {
    endpoint: HttpEndpoint,
}

impl OpenAiProvider {
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
impl Provider for OpenAiProvider {
    fn id(&self) -> &str {
        &self.endpoint.id
    }

    fn confidence(&self) -> u8 {
        self.endpoint.confidence
    }

    async fn complete(&self, text: &str, _ctx: &InvokeContext) -> Result<Completion, ProviderError> {
        let api_key = self.endpoint.credential()?;
        let wire_request = ChatCompletionRequest::user(&self.endpoint.model, text, self.endpoint.max_tokens);

        let builder = self
            .endpoint
            .post("chat/completions")
            .bearer_auth(api_key.expose_secret())
            .json(&wire_request);

        let wire_response: ChatCompletionResponse = self.endpoint.send(builder).await?;

        let content = wire_response
            .text()
            .ok_or_else(|| ProviderError::Malformed("response contained no message content".to_owned()))?
            .to_owned();

        Ok(Completion {
            content,
            tokens_used: wire_response.total_tokens(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chorus_config::ProviderType;
    use chorus_core::{Cost, ErrorKind, ProviderOutcome, Speed};
    use secrecy::SecretString;
    use url::Url;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::StaticCredentials;

    fn provider(server: &MockServer, key: Option<&str>) -> OpenAiProvider {
        let config = ProviderConfig {
            provider_type: ProviderType::Openai,
            model: "gpt-4o-mini".to_owned(),
            api_key: None,
            base_url: Some(Url::parse(&server.uri()).unwrap()),
            strengths: vec![],
            speed: Speed::Fast,
            cost: Cost::Low,
            confidence: 80,
            max_tokens: Some(256),
        };

        let mut creds = StaticCredentials::new();
        if let Some(key) = key {
            creds = creds.with("gpt", SecretString::from(key.to_owned()));
        }

        OpenAiProvider::new("gpt", &config, Arc::new(creds)).unwrap()
    }

    fn ctx() -> InvokeContext {
        InvokeContext::with_timeout(Duration::from_secs(5))
    }

    #[tokio::test]
    async fn returns_first_choice_with_usage() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o-mini",
                "max_tokens": 256,
                "messages": [{"role": "user", "content": "hello"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-1",
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "Hi there"}}],
                "usage": {"prompt_tokens": 5, "completion_tokens": 3, "total_tokens": 8}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = provider(&server, Some("sk-test")).invoke("hello", &ctx()).await;

        let ProviderOutcome::Success(success) = outcome else {
            panic!("expected success");
        };
        assert_eq!(success.provider_id, "gpt");
        assert_eq!(success.content, "Hi there");
        assert_eq!(success.tokens_used, 8);
        assert_eq!(success.confidence, 80);
    }

    #[tokio::test]
    async fn missing_credential_fails_without_calling_upstream() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let outcome = provider(&server, None).invoke("hello", &ctx()).await;

        let ProviderOutcome::Failure(failure) = outcome else {
            panic!("expected failure");
        };
        assert_eq!(failure.reason, ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn rejected_key_is_unauthorized() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let outcome = provider(&server, Some("sk-bad")).invoke("hello", &ctx()).await;

        let ProviderOutcome::Failure(failure) = outcome else {
            panic!("expected failure");
        };
        assert_eq!(failure.reason, ErrorKind::Unauthorized);
        assert!(failure.message.contains("invalid api key"));
    }

    #[tokio::test]
    async fn throttled_request_is_rate_limited() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
            .mount(&server)
            .await;

        let outcome = provider(&server, Some("sk-test")).invoke("hello", &ctx()).await;

        let ProviderOutcome::Failure(failure) = outcome else {
            panic!("expected failure");
        };
        assert_eq!(failure.reason, ErrorKind::RateLimited);
        assert!(failure.message.contains("retry after 7"));
    }

    #[tokio::test]
    async fn garbage_body_is_malformed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let outcome = provider(&server, Some("sk-test")).invoke("hello", &ctx()).await;

        let ProviderOutcome::Failure(failure) = outcome else {
            panic!("expected failure");
        };
        assert_eq!(failure.reason, ErrorKind::Malformed);
    }

    #[tokio::test]
    async fn empty_choices_are_malformed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
            .mount(&server)
            .await;

        let outcome = provider(&server, Some("sk-test")).invoke("hello", &ctx()).await;

        let ProviderOutcome::Failure(failure) = outcome else {
            panic!("expected failure");
        };
        assert_eq!(failure.reason, ErrorKind::Malformed);
    }

    #[tokio::test]
    async fn usage_without_counts_falls_back_to_estimate() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "Hi there"}}],
                "usage": {"prompt_tokens_details": {"cached_tokens": 0}}
            })))
            .mount(&server)
            .await;

        let outcome = provider(&server, Some("sk-test")).invoke("hello", &ctx()).await;

        let ProviderOutcome::Success(success) = outcome else {
            panic!("expected success");
        };
        assert_eq!(success.tokens_used, crate::tokens::estimate_exchange("hello", "Hi there"));
    }

    #[tokio::test]
    async fn server_error_is_unknown() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let outcome = provider(&server, Some("sk-test")).invoke("hello", &ctx()).await;

        let ProviderOutcome::Failure(failure) = outcome else {
            panic!("expected failure");
        };
        assert_eq!(failure.reason, ErrorKind::Unknown);
        assert!(failure.message.contains("boom"));
    }

    #[tokio::test]
    async fn slow_upstream_times_out_at_deadline() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"choices": [{"message": {"role": "assistant", "content": "late"}}]}))
                    .set_delay(Duration::from_secs(10)),
            )
            .mount(&server)
            .await;

        let started = std::time::Instant::now();
        let outcome = provider(&server, Some("sk-test"))
            .invoke("hello", &InvokeContext::with_timeout(Duration::from_millis(200)))
            .await;

        let ProviderOutcome::Failure(failure) = outcome else {
            panic!("expected failure");
        };
        assert_eq!(failure.reason, ErrorKind::Timeout);
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
