#![allow(clippy::must_use_candidate)]

mod env;
mod loader;
pub mod ledger;
pub mod providers;
pub mod router;
pub mod routing;
pub mod telemetry;

use indexmap::IndexMap;
use serde::Deserialize;

pub(crate) use loader::parse_duration;

pub use ledger::*;
pub use providers::*;
pub use router::*;
pub use routing::*;
pub use telemetry::*;

/// Top-level Chorus configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Dispatch and timeout settings
    #[serde(default)]
    pub router: RouterConfig,
    /// Usage ledger persistence
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Provider selection policy overrides
    #[serde(default)]
    pub routing: RoutingConfig,
    /// Logging configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// Provider configurations keyed by provider id, in declaration order
    #[serde(default)]
    pub providers: IndexMap<String, ProviderConfig>,
}
