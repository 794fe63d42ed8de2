//! Dispatch, synthesis, and usage accounting for Chorus
//!
//! [`Router`] ties the pipeline together: classify, select, dispatch
//! concurrently under a deadline, merge, and record usage.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod dispatch;
pub mod error;
pub mod ledger;
pub mod router;
pub mod synthesis;

pub use dispatch::Dispatcher;
pub use error::{LedgerError, RouterError};
pub use ledger::{JsonFileStore, UsageEntry, UsageLedger, UsageStore};
pub use router::Router;
pub use synthesis::combine;
