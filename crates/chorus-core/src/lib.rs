//! Shared data model for Chorus
//!
//! Types that flow between the classifier, selector, dispatcher, and
//! synthesizer. Nothing in this crate performs I/O.

#![allow(clippy::must_use_candidate)]

pub mod outcome;
pub mod request;
pub mod synthesis;
pub mod tier;

pub use outcome::{ErrorKind, ProviderFailure, ProviderOutcome, ProviderSuccess};
pub use request::{Mode, ParseModeError, Request, Signal};
pub use synthesis::SynthesisResult;
pub use tier::{Cost, Speed};
