//! Programmatic configuration builder for integration tests

use chorus_config::{Config, PolicyTable, ProviderConfig, ProviderType};
use chorus_core::{Cost, Speed};
use secrecy::SecretString;

use super::mock_provider::{MockProvider, Protocol};

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with a 2s per-call timeout
    pub fn new() -> Self {
        let mut config = Config::default();
        config.router.per_call_timeout = "2s".to_owned();
        Self { config }
    }

    /// Add a provider pointed at a mock backend, with a test credential
    pub fn with_provider(self, id: &str, mock: &MockProvider, protocol: Protocol, profile: Profile) -> Self {
        self.with_provider_key(id, mock, protocol, profile, Some("test-key"))
    }

    /// Add a provider pointed at a mock backend with an explicit credential
    pub fn with_provider_key(
        mut self,
        id: &str,
        mock: &MockProvider,
        protocol: Protocol,
        profile: Profile,
        key: Option<&str>,
    ) -> Self {
        let provider_type = match protocol {
            Protocol::OpenAi => ProviderType::Openai,
            Protocol::Anthropic => ProviderType::Anthropic,
            Protocol::Google => ProviderType::Google,
        };

        self.config.providers.insert(
            id.to_owned(),
            ProviderConfig {
                provider_type,
                model: format!("{id}-model"),
                api_key: key.map(|k| SecretString::from(k.to_owned())),
                base_url: Some(mock.base_url().parse().expect("valid URL")),
                strengths: profile.strengths.iter().map(|s| (*s).to_owned()).collect(),
                speed: profile.speed,
                cost: profile.cost,
                confidence: profile.confidence,
                max_tokens: Some(256),
            },
        );
        self
    }

    /// Set the per-call timeout (duration-str syntax)
    pub fn with_timeout(mut self, timeout: &str) -> Self {
        self.config.router.per_call_timeout = timeout.to_owned();
        self
    }

    /// Bind explicit providers to signals
    pub fn with_policies(mut self, policies: PolicyTable) -> Self {
        self.config.routing.policies = policies;
        self
    }

    /// Build and validate the final config
    pub fn build(self) -> Config {
        self.config.validate().expect("valid test configuration");
        self.config
    }
}

/// Descriptor fields for a mock-backed provider
#[derive(Debug, Clone, Copy)]
pub struct Profile {
    pub strengths: &'static [&'static str],
    pub speed: Speed,
    pub cost: Cost,
    pub confidence: u8,
}

impl Profile {
    pub const fn new(speed: Speed, cost: Cost, confidence: u8) -> Self {
        Self {
            strengths: &[],
            speed,
            cost,
            confidence,
        }
    }

    pub const fn with_strengths(mut self, strengths: &'static [&'static str]) -> Self {
        self.strengths = strengths;
        self
    }
}
