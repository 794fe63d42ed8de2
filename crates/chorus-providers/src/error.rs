use chorus_core::ErrorKind;
use reqwest::StatusCode;
use thiserror::Error;

/// Longest upstream error body kept in a failure message
const MAX_BODY_CHARS: usize = 512;

/// Errors raised while calling an upstream provider
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No credential is available for the provider
    #[error("no credential configured for provider `{provider}`")]
    MissingCredential { provider: String },

    /// Upstream rejected the credential
    #[error("provider rejected credential ({status}): {body}")]
    Unauthorized { status: StatusCode, body: String },

    /// Upstream asked the caller to back off
    #[error("provider rate limited the request ({status}){}", retry_hint(.retry_after.as_deref()))]
    RateLimited {
        status: StatusCode,
        retry_after: Option<String>,
    },

    /// Deadline passed before the provider answered
    #[error("deadline exceeded before the provider answered")]
    Timeout,

    /// Caller abandoned the request
    #[error("request cancelled by caller")]
    Cancelled,

    /// Response body could not be interpreted
    #[error("malformed provider response: {0}")]
    Malformed(String),

    /// Any other non-success status
    #[error("provider returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// Connection or protocol failure below HTTP
    #[error("transport error: {0}")]
    Transport(String),

    /// Adapter could not be constructed from its configuration
    #[error("invalid provider configuration: {0}")]
    Config(String),
}

impl ProviderError {
    /// Classify a non-success HTTP response
    pub fn from_status(status: StatusCode, retry_after: Option<String>, body: &str) -> Self {
        let body = truncate(body);

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Unauthorized { status, body },
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited { status, retry_after },
            StatusCode::SERVICE_UNAVAILABLE if retry_after.is_some() => Self::RateLimited { status, retry_after },
            _ => Self::Status { status, body },
        }
    }

    /// Failure reason reported in the provider outcome
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingCredential { .. } | Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::Timeout | Self::Cancelled => ErrorKind::Timeout,
            Self::Malformed(_) => ErrorKind::Malformed,
            Self::Status { .. } | Self::Transport(_) | Self::Config(_) => ErrorKind::Unknown,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::Malformed(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

fn retry_hint(retry_after: Option<&str>) -> String {
    retry_after.map(|s| format!(", retry after {s}")).unwrap_or_default()
}

fn truncate(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(MAX_BODY_CHARS) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_owned(),
    }
}
