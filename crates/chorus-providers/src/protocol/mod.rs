//! Minimal wire format types for each upstream API

pub mod anthropic;
pub mod google;
pub mod openai;
