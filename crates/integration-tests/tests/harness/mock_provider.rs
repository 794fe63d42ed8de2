//! Mock provider backends for integration tests
//!
//! Serves canned replies in the OpenAI, Anthropic, or Google wire format

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use tokio_util::sync::CancellationToken;

/// Wire protocol the mock speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    OpenAi,
    Anthropic,
    Google,
}

/// How the mock answers every request
#[derive(Debug, Clone)]
pub enum Reply {
    /// Valid completion with the given text and total token usage
    Answer { content: String, tokens: u64 },
    /// Error status with a short body
    Status(u16),
    /// Valid completion delivered after a delay
    Delayed { after: Duration, content: String },
    /// 200 with a body that is not JSON
    Garbage,
}

impl Reply {
    pub fn answer(content: &str, tokens: u64) -> Self {
        Self::Answer {
            content: content.to_owned(),
            tokens,
        }
    }
}

/// Mock upstream provider on a random local port
pub struct MockProvider {
    addr: SocketAddr,
    protocol: Protocol,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    protocol: Protocol,
    reply: Reply,
    request_count: AtomicU32,
    last_credential: std::sync::Mutex<Option<String>>,
}

impl MockProvider {
    /// Start the mock server, returning once it is listening
    pub async fn start(protocol: Protocol, reply: Reply) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            protocol,
            reply,
            request_count: AtomicU32::new(0),
            last_credential: std::sync::Mutex::new(None),
        });

        let app = Router::new()
            .route("/v1/chat/completions", routing::post(handle))
            .route("/v1/messages", routing::post(handle))
            .route("/v1beta/models/{action}", routing::post(handle))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self {
            addr,
            protocol,
            shutdown,
            state,
        })
    }

    /// Base URL to put in the provider's configuration
    pub fn base_url(&self) -> String {
        match self.protocol {
            Protocol::OpenAi | Protocol::Anthropic => format!("http://{}/v1", self.addr),
            Protocol::Google => format!("http://{}/v1beta", self.addr),
        }
    }

    /// Number of completion requests received
    pub fn request_count(&self) -> u32 {
        self.state.request_count.load(Ordering::Relaxed)
    }

    /// Credential presented on the most recent request
    pub fn last_credential(&self) -> Option<String> {
        self.state.last_credential.lock().unwrap().clone()
    }
}

impl Drop for MockProvider {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.request_count.fetch_add(1, Ordering::Relaxed);

    let credential = ["authorization", "x-api-key", "x-goog-api-key"]
        .iter()
        .find_map(|name| headers.get(*name))
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim_start_matches("Bearer ").to_owned());
    *state.last_credential.lock().unwrap() = credential;

    match &state.reply {
        Reply::Answer { content, tokens } => Json(body(state.protocol, content, *tokens)).into_response(),
        Reply::Status(code) => {
            let status = StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, format!("mock error {code}")).into_response()
        }
        Reply::Delayed { after, content } => {
            tokio::time::sleep(*after).await;
            Json(body(state.protocol, content, 1)).into_response()
        }
        Reply::Garbage => (StatusCode::OK, "<html>not json</html>").into_response(),
    }
}

fn body(protocol: Protocol, content: &str, tokens: u64) -> serde_json::Value {
    match protocol {
        Protocol::OpenAi => serde_json::json!({
            "id": "chatcmpl-mock",
            "object": "chat.completion",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 0, "completion_tokens": tokens, "total_tokens": tokens}
        }),
        Protocol::Anthropic => serde_json::json!({
            "id": "msg_mock",
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": content}],
            "usage": {"input_tokens": 0, "output_tokens": tokens}
        }),
        Protocol::Google => serde_json::json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": content}]}, "finishReason": "STOP"}],
            "usageMetadata": {"promptTokenCount": 0, "candidatesTokenCount": tokens, "totalTokenCount": tokens}
        }),
    }
}
