//! Per-provider usage accounting
//!
//! Lock-free counters keyed by provider id. Counters only grow; with a
//! store attached they are seeded from it at startup and flushed back
//! periodically, so totals survive restarts.

use std::collections::BTreeMap;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chorus_core::ProviderOutcome;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::LedgerError;

/// Point-in-time usage for one provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageEntry {
    pub tokens: u64,
    pub requests: u64,
    pub failures: u64,
}

#[derive(Debug, Default)]
struct UsageCounters {
    tokens: AtomicU64,
    requests: AtomicU64,
    failures: AtomicU64,
}

impl UsageCounters {
    fn add(&self, entry: UsageEntry) {
        saturating_add(&self.tokens, entry.tokens);
        saturating_add(&self.requests, entry.requests);
        saturating_add(&self.failures, entry.failures);
    }

    fn load(&self) -> UsageEntry {
        UsageEntry {
            tokens: self.tokens.load(Ordering::Relaxed),
            requests: self.requests.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// Counters pin at `u64::MAX` rather than wrapping
fn saturating_add(counter: &AtomicU64, n: u64) {
    // the closure always returns Some, so the update cannot fail
    let _ = counter.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| Some(v.saturating_add(n)));
}

/// Durable home for ledger snapshots
pub trait UsageStore: Send + Sync {
    /// Previously saved counters, empty when nothing was saved yet
    fn load(&self) -> Result<BTreeMap<String, UsageEntry>, LedgerError>;

    fn save(&self, snapshot: &BTreeMap<String, UsageEntry>) -> Result<(), LedgerError>;
}

/// Versioned on-disk document
#[derive(Debug, Serialize, Deserialize)]
struct UsageDocument {
    version: u32,
    providers: BTreeMap<String, UsageEntry>,
}

const DOCUMENT_VERSION: u32 = 1;

/// Stores snapshots as a JSON file, replaced atomically on save
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> LedgerError {
        LedgerError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl UsageStore for JsonFileStore {
    fn load(&self) -> Result<BTreeMap<String, UsageEntry>, LedgerError> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(self.io_error(e)),
        };

        let document: UsageDocument = serde_json::from_slice(&raw).map_err(|source| LedgerError::Format {
            path: self.path.clone(),
            source,
        })?;

        Ok(document.providers)
    }

    fn save(&self, snapshot: &BTreeMap<String, UsageEntry>) -> Result<(), LedgerError> {
        let document = UsageDocument {
            version: DOCUMENT_VERSION,
            providers: snapshot.clone(),
        };
        let body = serde_json::to_vec_pretty(&document).map_err(|source| LedgerError::Format {
            path: self.path.clone(),
            source,
        })?;

        let parent = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
                parent
            }
            None => Path::new("."),
        };

        // unique temp name per save so overlapping flushes never share a file
        let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(|e| self.io_error(e))?;
        tmp.write_all(&body).map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path).map_err(|e| self.io_error(e.error))?;
        Ok(())
    }
}

/// Additive token and request counters per provider
///
/// Shared behind an `Arc`; every method takes `&self` and is safe under
/// concurrent writers.
#[derive(Default)]
pub struct UsageLedger {
    counters: DashMap<String, UsageCounters>,
    store: Option<Arc<dyn UsageStore>>,
}

impl UsageLedger {
    /// In-memory ledger with no persistence
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger seeded from `store` and flushed back to it
    pub fn load_from(store: Arc<dyn UsageStore>) -> Result<Self, LedgerError> {
        let saved = store.load()?;
        let ledger = Self {
            counters: DashMap::new(),
            store: Some(store),
        };

        for (id, entry) in saved {
            ledger.counters.entry(id).or_default().add(entry);
        }

        tracing::debug!(providers = ledger.counters.len(), "usage ledger loaded");

        Ok(ledger)
    }

    /// Account for one provider outcome
    pub fn record(&self, outcome: &ProviderOutcome) {
        let entry = UsageEntry {
            tokens: outcome.tokens_used(),
            requests: 1,
            failures: u64::from(!outcome.is_success()),
        };

        self.counters
            .entry(outcome.provider_id().to_owned())
            .or_default()
            .add(entry);
    }

    /// Tokens consumed per provider
    pub fn usage(&self) -> BTreeMap<String, u64> {
        self.counters
            .iter()
            .map(|item| (item.key().clone(), item.value().tokens.load(Ordering::Relaxed)))
            .collect()
    }

    /// All counters per provider
    pub fn snapshot(&self) -> BTreeMap<String, UsageEntry> {
        self.counters
            .iter()
            .map(|item| (item.key().clone(), item.value().load()))
            .collect()
    }

    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    /// Write the current counters to the store, if any
    pub fn flush(&self) -> Result<(), LedgerError> {
        let Some(store) = &self.store else {
            return Ok(());
        };

        store.save(&self.snapshot())?;
        tracing::debug!("usage ledger flushed");
        Ok(())
    }

    /// Flush without blocking the async runtime
    pub async fn flush_async(self: &Arc<Self>) -> Result<(), LedgerError> {
        let ledger = Arc::clone(self);
        tokio::task::spawn_blocking(move || ledger.flush())
            .await
            .map_err(|e| LedgerError::Task(e.to_string()))?
    }

    /// Flush every `interval` until `cancel` fires, then flush once more
    pub fn spawn_flusher(self: &Arc<Self>, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        let ledger = Arc::clone(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = ledger.flush_async().await {
                            tracing::warn!(error = %e, "periodic usage flush failed");
                        }
                    }
                }
            }

            if let Err(e) = ledger.flush_async().await {
                tracing::warn!(error = %e, "final usage flush failed");
            }

            tracing::debug!("usage flusher shutting down");
        })
    }
}

impl std::fmt::Debug for UsageLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageLedger")
            .field("providers", &self.counters.len())
            .field("persistent", &self.store.is_some())
            .finish()
    }
}
