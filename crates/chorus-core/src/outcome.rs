//! Terminal results of a single provider invocation

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Classified reason a provider invocation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or rejected credential
    Unauthorized,
    /// Deadline exceeded or caller cancelled
    Timeout,
    /// Provider-reported quota or backoff signal
    RateLimited,
    /// Unparseable provider response
    Malformed,
    /// Anything else, wrapped with the original message
    Unknown,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Timeout => "timeout",
            Self::RateLimited => "rate_limited",
            Self::Malformed => "malformed",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provider answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSuccess {
    pub provider_id: String,
    pub content: String,
    /// Opaque provider-supplied score, 0 to 100
    pub confidence: u8,
    pub tokens_used: u64,
    pub latency: Duration,
}

/// A provider did not answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    pub provider_id: String,
    pub reason: ErrorKind,
    pub message: String,
    pub latency: Duration,
    /// Usage consumed before failing; adapters report 0 when unknown
    pub tokens_used: u64,
}

/// Result of one provider invocation for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderOutcome {
    Success(ProviderSuccess),
    Failure(ProviderFailure),
}

impl ProviderOutcome {
    /// Build a failure outcome with no recorded usage
    pub fn failure(
        provider_id: impl Into<String>,
        reason: ErrorKind,
        message: impl Into<String>,
        latency: Duration,
    ) -> Self {
        Self::Failure(ProviderFailure {
            provider_id: provider_id.into(),
            reason,
            message: message.into(),
            latency,
            tokens_used: 0,
        })
    }

    pub fn provider_id(&self) -> &str {
        match self {
            Self::Success(s) => &s.provider_id,
            Self::Failure(f) => &f.provider_id,
        }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub const fn tokens_used(&self) -> u64 {
        match self {
            Self::Success(s) => s.tokens_used,
            Self::Failure(f) => f.tokens_used,
        }
    }

    pub const fn latency(&self) -> Duration {
        match self {
            Self::Success(s) => s.latency,
            Self::Failure(f) => f.latency,
        }
    }
}
