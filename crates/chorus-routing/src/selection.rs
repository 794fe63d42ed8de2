//! Provider selection keyed by `(signal, mode)`
//!
//! Deep mode fans out to every provider. Normal mode picks a small set
//! through a per-signal policy computed from provider descriptors, unless
//! configuration binds explicit ids to that signal.

use std::collections::{HashMap, HashSet};

use chorus_config::PolicyTable;
use chorus_core::{Mode, Signal};

use crate::error::RoutingError;
use crate::registry::{ProviderDescriptor, ProviderRegistry};

/// Providers picked per signal in normal mode
const NORMAL_FANOUT: usize = 2;

/// Strength tag marking a provider suited to drafting
const GENERATION_STRENGTH: &str = "generation";

/// Maps a classified request onto the providers that should answer it
#[derive(Debug, Clone)]
pub struct Selector {
    registry: ProviderRegistry,
    overrides: HashMap<Signal, Vec<String>>,
}

impl Selector {
    /// Build a selector over a registry and optional explicit bindings
    ///
    /// A bound id that names no configured provider is rejected, matching
    /// config validation. Repeated ids are collapsed, and an empty binding
    /// falls back to the computed policy.
    pub fn new(registry: ProviderRegistry, policies: &PolicyTable) -> Result<Self, RoutingError> {
        if registry.is_empty() {
            return Err(RoutingError::NoProviders);
        }

        let mut seen = HashSet::new();
        for descriptor in registry.descriptors() {
            if !seen.insert(descriptor.id.as_str()) {
                return Err(RoutingError::DuplicateProvider {
                    id: descriptor.id.clone(),
                });
            }
        }

        let mut overrides = HashMap::new();
        for (signal, ids) in policies.bindings() {
            let mut resolved: Vec<String> = Vec::with_capacity(ids.len());
            for id in ids {
                if !registry.contains(id) {
                    return Err(RoutingError::UnknownPolicyProvider {
                        signal,
                        id: id.clone(),
                    });
                }
                if !resolved.contains(id) {
                    resolved.push(id.clone());
                }
            }

            if resolved.is_empty() {
                tracing::debug!(%signal, "empty policy binding, using computed policy");
            } else {
                overrides.insert(signal, resolved);
            }
        }

        Ok(Self { registry, overrides })
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Choose provider ids for a request
    ///
    /// Always non-empty, duplicate-free, and no longer than the registry.
    pub fn select(&self, signal: Signal, mode: Mode) -> Vec<String> {
        let selected = match mode {
            Mode::Deep => self.registry.ids(),
            Mode::Normal => match self.overrides.get(&signal) {
                Some(ids) => ids.clone(),
                None => self.computed(signal),
            },
        };

        tracing::debug!(%signal, %mode, providers = ?selected, "providers selected");

        selected
    }

    fn computed(&self, signal: Signal) -> Vec<String> {
        let picks: Vec<&ProviderDescriptor> = match signal {
            Signal::LegalComplex => self.registry.by_quality(),
            Signal::FastSummary => self.registry.by_speed(),
            Signal::Generation => {
                let generator = self
                    .registry
                    .by_cost()
                    .into_iter()
                    .find(|p| p.has_strength(GENERATION_STRENGTH))
                    .or_else(|| self.registry.by_cost().into_iter().next());
                let reviewer = self.registry.by_quality();
                generator.into_iter().chain(reviewer).collect()
            }
            Signal::General => {
                let best = self.registry.best_quality();
                let fastest = self.registry.by_speed();
                best.into_iter().chain(fastest).collect()
            }
        };

        distinct(picks, NORMAL_FANOUT)
    }
}

/// First `limit` distinct ids, keeping order
fn distinct(picks: Vec<&ProviderDescriptor>, limit: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(limit);
    for p in picks {
        if out.len() == limit {
            break;
        }
        if !out.contains(&p.id) {
            out.push(p.id.clone());
        }
    }
    out
}
