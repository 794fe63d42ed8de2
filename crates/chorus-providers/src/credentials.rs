//! Credential lookup at invocation time

use std::collections::HashMap;

use chorus_config::ProviderConfig;
use indexmap::IndexMap;
use secrecy::{ExposeSecret, SecretString};

/// Supplies provider credentials on demand
///
/// Acquisition and rotation live outside Chorus; adapters only ask for the
/// current value right before each call.
pub trait CredentialSource: Send + Sync {
    /// Current credential for a provider, `None` when unavailable
    fn credential(&self, provider_id: &str) -> Option<SecretString>;
}

/// Credentials fixed at startup, usually expanded from the environment
#[derive(Debug, Default)]
pub struct StaticCredentials {
    keys: HashMap<String, SecretString>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the `api_key` of every configured provider
    pub fn from_config(providers: &IndexMap<String, ProviderConfig>) -> Self {
        providers
            .iter()
            .filter_map(|(id, config)| config.api_key.as_ref().map(|key| (id, key)))
            .fold(Self::new(), |creds, (id, key)| creds.with(id, key.clone()))
    }

    /// Add a credential; blank values are ignored
    #[must_use]
    pub fn with(mut self, provider_id: impl Into<String>, key: SecretString) -> Self {
        if !key.expose_secret().trim().is_empty() {
            self.keys.insert(provider_id.into(), key);
        }
        self
    }
}

impl CredentialSource for StaticCredentials {
    fn credential(&self, provider_id: &str) -> Option<SecretString> {
        self.keys.get(provider_id).cloned()
    }
}
