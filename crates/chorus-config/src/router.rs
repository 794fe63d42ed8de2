use std::time::Duration;

use serde::Deserialize;

/// Dispatch configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouterConfig {
    /// Per-provider call timeout (e.g. "30s", "1m")
    #[serde(default = "default_per_call_timeout")]
    pub per_call_timeout: String,
}

impl RouterConfig {
    /// Parse the configured per-call timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the duration string cannot be parsed
    pub fn timeout(&self) -> anyhow::Result<Duration> {
        crate::parse_duration(&self.per_call_timeout)
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            per_call_timeout: default_per_call_timeout(),
        }
    }
}

fn default_per_call_timeout() -> String {
    "30s".to_owned()
}
