//! Provider registry with strength, speed, and cost profiles
//!
//! Static descriptors sourced from TOML configuration, kept in declaration
//! order. Nothing here changes after startup.

use std::cmp::Reverse;
use std::collections::BTreeSet;

use chorus_config::ProviderConfig;
use chorus_core::{Cost, Speed};
use indexmap::IndexMap;

/// Strength tags that mark a provider as a quality or analysis choice
const QUALITY_STRENGTHS: [&str; 3] = ["quality", "analysis", "legal"];

/// Static profile of one configured provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDescriptor {
    /// Provider id, the key of its `[providers.<id>]` table
    pub id: String,
    /// Lowercased strength tags
    pub strengths: BTreeSet<String>,
    pub relative_speed: Speed,
    pub relative_cost: Cost,
}

impl ProviderDescriptor {
    pub fn new(id: impl Into<String>, strengths: &[&str], relative_speed: Speed, relative_cost: Cost) -> Self {
        Self {
            id: id.into(),
            strengths: strengths.iter().map(|s| s.to_lowercase()).collect(),
            relative_speed,
            relative_cost,
        }
    }

    /// Whether the provider carries the given strength tag
    pub fn has_strength(&self, tag: &str) -> bool {
        self.strengths.contains(&tag.to_lowercase())
    }

    /// Whether the provider is tagged for quality-sensitive work
    pub fn is_quality(&self) -> bool {
        QUALITY_STRENGTHS.iter().any(|tag| self.strengths.contains(*tag))
    }
}

/// Registry of all configured providers
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<ProviderDescriptor>,
}

impl ProviderRegistry {
    /// Build a registry from configuration, preserving declaration order
    pub fn from_config(configs: &IndexMap<String, ProviderConfig>) -> Self {
        let providers = configs
            .iter()
            .map(|(id, c)| ProviderDescriptor {
                id: id.clone(),
                strengths: c.strengths.iter().map(|s| s.trim().to_lowercase()).collect(),
                relative_speed: c.speed,
                relative_cost: c.cost,
            })
            .collect();

        Self { providers }
    }

    /// Build a registry from descriptors directly
    pub fn from_descriptors(providers: Vec<ProviderDescriptor>) -> Self {
        Self { providers }
    }

    /// All descriptors in configuration order
    pub fn descriptors(&self) -> &[ProviderDescriptor] {
        &self.providers
    }

    /// Provider ids in configuration order
    pub fn ids(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.id.clone()).collect()
    }

    /// Find a descriptor by provider id
    pub fn find(&self, id: &str) -> Option<&ProviderDescriptor> {
        self.providers.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Descriptors ranked best quality first
    ///
    /// Quality-tagged providers lead, then higher cost, then slower tier.
    /// The sort is stable, so configuration order breaks remaining ties.
    pub fn by_quality(&self) -> Vec<&ProviderDescriptor> {
        let mut sorted: Vec<&ProviderDescriptor> = self.providers.iter().collect();
        sorted.sort_by_key(|p| (Reverse(p.is_quality()), Reverse(p.relative_cost), Reverse(p.relative_speed)));
        sorted
    }

    /// Descriptors ranked fastest first, cheaper breaking ties
    pub fn by_speed(&self) -> Vec<&ProviderDescriptor> {
        let mut sorted: Vec<&ProviderDescriptor> = self.providers.iter().collect();
        sorted.sort_by_key(|p| (p.relative_speed, p.relative_cost));
        sorted
    }

    /// Descriptors ranked cheapest first, faster breaking ties
    pub fn by_cost(&self) -> Vec<&ProviderDescriptor> {
        let mut sorted: Vec<&ProviderDescriptor> = self.providers.iter().collect();
        sorted.sort_by_key(|p| (p.relative_cost, p.relative_speed));
        sorted
    }

    /// Highest quality provider
    pub fn best_quality(&self) -> Option<&ProviderDescriptor> {
        self.by_quality().into_iter().next()
    }
}
