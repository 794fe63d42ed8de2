//! Provider selection for Chorus
//!
//! - **Classifier**: keyword and structural heuristics map request text to a [`Signal`]
//! - **Registry**: static provider descriptors loaded from configuration
//! - **Selector**: `(signal, mode)` to an ordered, non-empty set of provider ids

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod analysis;
pub mod error;
pub mod registry;
pub mod selection;

pub use analysis::{QueryProfile, analyze, classify};
pub use chorus_core::Signal;
pub use error::RoutingError;
pub use registry::{ProviderDescriptor, ProviderRegistry};
pub use selection::Selector;
