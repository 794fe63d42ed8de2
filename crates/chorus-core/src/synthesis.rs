//! The single merged answer returned to callers

use serde::{Deserialize, Serialize};

use crate::request::Mode;

/// Combined response for one routed request
///
/// An empty `contributing_providers` is the only reliable total-failure
/// signal; a single weak success still contributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisResult {
    pub content: String,
    pub contributing_providers: Vec<String>,
    pub total_tokens: u64,
    /// Rounded mean of contributing confidences, 0 to 100
    pub confidence: u8,
    pub mode: Mode,
    pub partial_failure_count: usize,
}

impl SynthesisResult {
    pub fn is_total_failure(&self) -> bool {
        self.contributing_providers.is_empty()
    }

    /// Whether some provider failed while others still answered
    pub fn is_degraded(&self) -> bool {
        !self.is_total_failure() && self.partial_failure_count > 0
    }
}
