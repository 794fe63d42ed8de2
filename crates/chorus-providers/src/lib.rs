//! Provider adapters for Chorus
//!
//! A uniform [`Provider`] interface over OpenAI-compatible, Anthropic, and
//! Google text-generation APIs. Every invocation ends in a
//! [`ProviderOutcome`](chorus_core::ProviderOutcome); adapter errors never
//! escape as `Err`.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod context;
pub mod credentials;
pub mod error;
pub mod protocol;
pub mod provider;
pub mod tokens;

pub use context::InvokeContext;
pub use credentials::{CredentialSource, StaticCredentials};
pub use error::ProviderError;
pub use provider::{Completion, Provider, build_providers};
