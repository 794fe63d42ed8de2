//! Incoming requests, processing modes, and classification signals

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Caller-selected policy trading cost and latency against provider coverage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Policy-selected pair or triple of providers
    #[default]
    Normal,
    /// Every configured provider
    Deep,
}

impl Mode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Deep => "deep",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mode string outside `normal` / `deep`
///
/// This is a caller defect, not a provider failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown processing mode `{0}` (expected `normal` or `deep`)")]
pub struct ParseModeError(pub String);

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "deep" => Ok(Self::Deep),
            _ => Err(ParseModeError(s.to_owned())),
        }
    }
}

/// A single natural-language request, immutable once created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    text: String,
    mode: Mode,
}

impl Request {
    pub fn new(text: impl Into<String>, mode: Mode) -> Self {
        Self {
            text: text.into(),
            mode,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub const fn mode(&self) -> Mode {
        self.mode
    }
}

/// Topic/intent signal produced by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    /// Legal-domain or otherwise analysis-heavy text
    LegalComplex,
    /// Drafting and writing tasks
    Generation,
    /// Requests for a short or quick answer
    FastSummary,
    /// Anything else, including ambiguous text
    General,
}

impl Signal {
    pub const ALL: [Self; 4] = [Self::LegalComplex, Self::Generation, Self::FastSummary, Self::General];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LegalComplex => "legal_complex",
            Self::Generation => "generation",
            Self::FastSummary => "fast_summary",
            Self::General => "general",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
