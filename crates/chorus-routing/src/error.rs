//! Routing-specific error types

use chorus_core::Signal;
use thiserror::Error;

/// Configuration defects detected while building the selector
#[derive(Debug, Error)]
pub enum RoutingError {
    /// No providers configured
    #[error("no providers configured for routing")]
    NoProviders,

    /// A provider id appears more than once in the registry
    #[error("duplicate provider id: {id}")]
    DuplicateProvider { id: String },

    /// A policy binding names a provider that is not configured
    #[error("routing policy '{signal}' references unknown provider '{id}'")]
    UnknownPolicyProvider { signal: Signal, id: String },
}
