//! Relative speed and cost tiers for provider descriptors

use serde::{Deserialize, Serialize};

/// Relative response speed of a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speed {
    Fast,
    #[default]
    Medium,
    Slow,
}

/// Relative per-token cost of a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cost {
    Low,
    #[default]
    Medium,
    High,
}
