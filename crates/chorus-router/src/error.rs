use std::path::PathBuf;

use chorus_providers::ProviderError;
use chorus_routing::RoutingError;
use thiserror::Error;

/// Defects that prevent a router from being assembled
///
/// Provider failures during a route are never reported here; they end up
/// in the synthesized result.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error(transparent)]
    Routing(#[from] RoutingError),

    /// An adapter could not be built from configuration
    #[error("failed to build provider adapter: {0}")]
    Provider(#[from] ProviderError),

    /// A selectable provider has no adapter behind it
    #[error("provider `{id}` is selectable but has no adapter")]
    MissingAdapter { id: String },

    /// Invalid router settings
    #[error("invalid router configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Usage ledger persistence failures
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("failed to access usage file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("usage file {} is not valid JSON: {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Background flush task failed to complete
    #[error("usage flush task failed: {0}")]
    Task(String),
}
