use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Usage ledger persistence configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerConfig {
    /// JSON file the ledger is loaded from and flushed to; in-memory only when absent
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// How often to flush counters while running
    #[serde(default = "default_flush_interval")]
    pub flush_interval: String,
}

impl LedgerConfig {
    /// Parse the configured flush interval
    ///
    /// # Errors
    ///
    /// Returns an error if the duration string cannot be parsed
    pub fn flush_every(&self) -> anyhow::Result<Duration> {
        crate::parse_duration(&self.flush_interval)
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: None,
            flush_interval: default_flush_interval(),
        }
    }
}

fn default_flush_interval() -> String {
    "60s".to_owned()
}
