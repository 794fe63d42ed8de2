use chorus_core::Signal;
use serde::Deserialize;

/// Provider selection configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    /// Explicit provider bindings for normal-mode policy slots
    #[serde(default)]
    pub policies: PolicyTable,
}

/// Provider ids bound to each signal in normal mode
///
/// Unset slots fall back to the policy computed from provider descriptors.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyTable {
    #[serde(default)]
    pub legal_complex: Option<Vec<String>>,
    #[serde(default)]
    pub generation: Option<Vec<String>>,
    #[serde(default)]
    pub fast_summary: Option<Vec<String>>,
    #[serde(default)]
    pub general: Option<Vec<String>>,
}

impl PolicyTable {
    /// Explicit binding for a signal, if any
    pub fn get(&self, signal: Signal) -> Option<&[String]> {
        match signal {
            Signal::LegalComplex => self.legal_complex.as_deref(),
            Signal::Generation => self.generation.as_deref(),
            Signal::FastSummary => self.fast_summary.as_deref(),
            Signal::General => self.general.as_deref(),
        }
    }

    /// Iterate over every configured binding
    pub fn bindings(&self) -> impl Iterator<Item = (Signal, &[String])> {
        Signal::ALL
            .into_iter()
            .filter_map(|signal| self.get(signal).map(|ids| (signal, ids)))
    }
}
