use std::path::Path;
use std::time::Duration;

use crate::Config;

/// Parse a human-readable duration such as `"30s"` or `"2m"`
pub(crate) fn parse_duration(s: &str) -> anyhow::Result<Duration> {
    duration_str::parse(s).map_err(|e| anyhow::anyhow!("invalid duration '{s}': {e}"))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml_str(&raw)
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing, or validation fails
    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if no provider is configured, a provider entry is
    /// out of range, a duration is unparseable, or a policy references an
    /// unknown provider
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_providers()?;
        self.validate_durations()?;
        self.validate_policies()?;
        Ok(())
    }

    fn validate_providers(&self) -> anyhow::Result<()> {
        if self.providers.is_empty() {
            anyhow::bail!("at least one provider must be configured");
        }

        for (id, provider) in &self.providers {
            if provider.confidence > 100 {
                anyhow::bail!("provider '{id}' confidence must be between 0 and 100");
            }
            if provider.model.trim().is_empty() {
                anyhow::bail!("provider '{id}' must name a model");
            }
            if provider.max_tokens == Some(0) {
                anyhow::bail!("provider '{id}' max_tokens must be greater than 0");
            }
        }

        Ok(())
    }

    fn validate_durations(&self) -> anyhow::Result<()> {
        if self.router.timeout()?.is_zero() {
            anyhow::bail!("router.per_call_timeout must be greater than 0");
        }

        if self.ledger.flush_every()?.is_zero() {
            anyhow::bail!("ledger.flush_interval must be greater than 0");
        }

        Ok(())
    }

    fn validate_policies(&self) -> anyhow::Result<()> {
        for (signal, ids) in self.routing.policies.bindings() {
            for id in ids {
                if !self.providers.contains_key(id) {
                    anyhow::bail!("routing policy '{signal}' references unknown provider '{id}'");
                }
            }
        }

        Ok(())
    }
}
