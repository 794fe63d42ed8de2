//! Request entry point
//!
//! classify -> select -> dispatch -> synthesize -> record usage

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chorus_config::Config;
use chorus_core::{Mode, Request, SynthesisResult};
use chorus_providers::{CredentialSource, Provider, build_providers};
use chorus_routing::{ProviderRegistry, Selector, analyze};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::dispatch::Dispatcher;
use crate::error::RouterError;
use crate::ledger::UsageLedger;
use crate::synthesis::combine;

/// Routes requests across providers and merges their answers
pub struct Router {
    selector: Selector,
    dispatcher: Dispatcher,
    ledger: Arc<UsageLedger>,
    per_call_timeout: Duration,
}

impl Router {
    /// Assemble a router from its parts
    ///
    /// Every provider the selector can pick must have an adapter.
    pub fn new(
        selector: Selector,
        providers: Vec<Arc<dyn Provider>>,
        ledger: Arc<UsageLedger>,
        per_call_timeout: Duration,
    ) -> Result<Self, RouterError> {
        if per_call_timeout.is_zero() {
            return Err(RouterError::Config("per-call timeout must be greater than 0".to_owned()));
        }

        let dispatcher = Dispatcher::new(providers);

        if let Some(missing) = selector
            .registry()
            .descriptors()
            .iter()
            .find(|d| !dispatcher.contains(&d.id))
        {
            return Err(RouterError::MissingAdapter { id: missing.id.clone() });
        }

        Ok(Self {
            selector,
            dispatcher,
            ledger,
            per_call_timeout,
        })
    }

    /// Build adapters, registry, and selector from configuration
    pub fn from_config(
        config: &Config,
        credentials: &Arc<dyn CredentialSource>,
        ledger: Arc<UsageLedger>,
    ) -> Result<Self, RouterError> {
        let registry = ProviderRegistry::from_config(&config.providers);
        let selector = Selector::new(registry, &config.routing.policies)?;
        let providers = build_providers(&config.providers, credentials)?;
        let per_call_timeout = config
            .router
            .timeout()
            .map_err(|e| RouterError::Config(e.to_string()))?;

        tracing::info!(
            providers = providers.len(),
            timeout = ?per_call_timeout,
            persistent_usage = ledger.has_store(),
            "router initialized"
        );

        Self::new(selector, providers, ledger, per_call_timeout)
    }

    /// Route one request and return the merged answer
    ///
    /// Provider problems never surface as errors; they are folded into the
    /// result's failure count and content.
    pub async fn route(&self, text: &str, mode: Mode) -> SynthesisResult {
        self.route_with_cancel(text, mode, &CancellationToken::new()).await
    }

    /// Like [`route`](Self::route), abandoning provider calls once `cancel` fires
    pub async fn route_with_cancel(&self, text: &str, mode: Mode, cancel: &CancellationToken) -> SynthesisResult {
        let request = Request::new(text, mode);
        let profile = analyze(request.text());

        let span = tracing::info_span!(
            "route",
            request_id = %Uuid::new_v4(),
            signal = %profile.signal,
            mode = %mode,
        );

        async {
            tracing::debug!(
                words = profile.word_count,
                sentences = profile.sentence_count,
                legal_hits = profile.term_hits.legal,
                generation_hits = profile.term_hits.generation,
                brevity_hits = profile.term_hits.brevity,
                "request classified"
            );

            let provider_ids = self.selector.select(profile.signal, mode);

            let outcomes = self
                .dispatcher
                .dispatch(&request, &provider_ids, self.per_call_timeout, cancel)
                .await;

            for outcome in &outcomes {
                self.ledger.record(outcome);
            }

            let result = combine(&outcomes, &request);

            if result.is_total_failure() {
                tracing::warn!(failures = result.partial_failure_count, "every selected provider failed");
            } else {
                tracing::info!(
                    providers = ?result.contributing_providers,
                    failures = result.partial_failure_count,
                    tokens = result.total_tokens,
                    confidence = result.confidence,
                    "request synthesized"
                );
            }

            result
        }
        .instrument(span)
        .await
    }

    /// Tokens consumed per provider since the ledger was created or loaded
    pub fn usage(&self) -> BTreeMap<String, u64> {
        self.ledger.usage()
    }

    pub fn ledger(&self) -> &Arc<UsageLedger> {
        &self.ledger
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub const fn per_call_timeout(&self) -> Duration {
        self.per_call_timeout
    }
}
