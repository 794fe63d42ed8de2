use chorus_core::{Cost, Speed};
use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Confidence reported for a provider when none is configured
pub const DEFAULT_CONFIDENCE: u8 = 75;

/// Configuration for a single upstream text-generation provider
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Wire protocol spoken by the provider
    #[serde(rename = "type")]
    pub provider_type: ProviderType,
    /// Model identifier sent upstream
    pub model: String,
    /// Bearer credential; a provider without one always fails as unauthorized
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Base URL override
    #[serde(default)]
    pub base_url: Option<Url>,
    /// Free-form strength tags (e.g. "legal", "generation", "quality")
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub speed: Speed,
    #[serde(default)]
    pub cost: Cost,
    /// Opaque confidence attached to every answer from this provider (0-100)
    #[serde(default = "default_confidence")]
    pub confidence: u8,
    /// Maximum tokens to generate
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

/// Supported provider protocols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    /// OpenAI-compatible chat completions
    Openai,
    /// Anthropic Messages API
    Anthropic,
    /// Google Generative Language API
    Google,
}

const fn default_confidence() -> u8 {
    DEFAULT_CONFIDENCE
}
