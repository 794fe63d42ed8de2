//! Concurrent fan-out to selected providers
//!
//! One spawned task per provider id, all bounded by a shared deadline and
//! a child cancellation token scoped to the dispatch. Every requested id
//! gets exactly one outcome, in request order.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chorus_core::{ErrorKind, ProviderOutcome, Request};
use chorus_providers::{InvokeContext, Provider};
use futures_util::future::join_all;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Slack past the deadline before a still-running task is aborted
///
/// Adapters enforce the deadline themselves; this only covers tasks that
/// fail to yield.
pub const ABORT_GRACE: Duration = Duration::from_millis(250);

/// Runs provider invocations concurrently
pub struct Dispatcher {
    providers: HashMap<String, Arc<dyn Provider>>,
}

enum Slot {
    Running(String, JoinHandle<ProviderOutcome>),
    Settled(ProviderOutcome),
}

impl Dispatcher {
    pub fn new(providers: impl IntoIterator<Item = Arc<dyn Provider>>) -> Self {
        let providers = providers
            .into_iter()
            .map(|p| (p.id().to_owned(), p))
            .collect();

        Self { providers }
    }

    /// Whether an adapter is registered for `id`
    pub fn contains(&self, id: &str) -> bool {
        self.providers.contains_key(id)
    }

    /// Invoke every provider in `provider_ids` with a fresh deadline
    pub async fn dispatch(
        &self,
        request: &Request,
        provider_ids: &[String],
        per_call_timeout: Duration,
        cancel: &CancellationToken,
    ) -> Vec<ProviderOutcome> {
        let deadline = Instant::now() + per_call_timeout;
        self.dispatch_until(request, provider_ids, deadline, cancel).await
    }

    /// Invoke every provider in `provider_ids` under an explicit deadline
    ///
    /// Dropping the returned future cancels every in-flight call.
    pub async fn dispatch_until(
        &self,
        request: &Request,
        provider_ids: &[String],
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Vec<ProviderOutcome> {
        let scope = cancel.child_token();
        let _abandon = scope.clone().drop_guard();

        let started = Instant::now();
        let text: Arc<str> = Arc::from(request.text());

        tracing::debug!(providers = provider_ids.len(), "dispatching request");

        let slots: Vec<Slot> = provider_ids
            .iter()
            .map(|id| self.spawn(id, &text, deadline, &scope))
            .collect();

        join_all(slots.into_iter().map(|slot| settle(slot, deadline, started))).await
    }

    fn spawn(&self, id: &str, text: &Arc<str>, deadline: Instant, scope: &CancellationToken) -> Slot {
        let Some(provider) = self.providers.get(id) else {
            tracing::error!(provider = %id, "no adapter registered for provider");
            return Slot::Settled(ProviderOutcome::failure(
                id,
                ErrorKind::Unknown,
                "no adapter registered for this provider",
                Duration::ZERO,
            ));
        };

        let provider = Arc::clone(provider);
        let text = Arc::clone(text);
        let ctx = InvokeContext::new(deadline, scope.child_token());

        Slot::Running(
            id.to_owned(),
            tokio::spawn(async move { provider.invoke(&text, &ctx).await }),
        )
    }
}

async fn settle(slot: Slot, deadline: Instant, started: Instant) -> ProviderOutcome {
    let (id, mut handle) = match slot {
        Slot::Settled(outcome) => return outcome,
        Slot::Running(id, handle) => (id, handle),
    };

    match tokio::time::timeout_at(deadline + ABORT_GRACE, &mut handle).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) if e.is_panic() => {
            tracing::error!(provider = %id, "provider task panicked");
            ProviderOutcome::failure(id, ErrorKind::Unknown, "provider task panicked", started.elapsed())
        }
        Ok(Err(_)) => ProviderOutcome::failure(id, ErrorKind::Timeout, "provider task was cancelled", started.elapsed()),
        Err(_) => {
            handle.abort();
            tracing::warn!(provider = %id, "provider task overran its deadline, aborted");
            ProviderOutcome::failure(
                id,
                ErrorKind::Timeout,
                "provider did not answer before the deadline",
                started.elapsed(),
            )
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chorus_core::Mode;
    use chorus_providers::{Completion, ProviderError};

    use super::*;

    /// Deterministic stand-in for a network provider
    pub(crate) struct Fake {
        pub(crate) id: String,
        pub(crate) confidence: u8,
        pub(crate) delay: Duration,
        pub(crate) behavior: Behavior,
        pub(crate) seen_token: Arc<Mutex<Option<CancellationToken>>>,
    }

    #[derive(Clone)]
    pub(crate) enum Behavior {
        Answer { content: String, tokens: u64 },
        Fail(ErrorKind),
        Hang,
        Block,
        Panic,
    }

    impl Fake {
        pub(crate) fn answering(id: &str, confidence: u8, tokens: u64, delay: Duration) -> Arc<dyn Provider> {
            Arc::new(Self {
                id: id.to_owned(),
                confidence,
                delay,
                behavior: Behavior::Answer {
                    content: format!("answer from {id}"),
                    tokens,
                },
                seen_token: Arc::default(),
            })
        }

        pub(crate) fn with(id: &str, behavior: Behavior) -> Arc<dyn Provider> {
            Arc::new(Self {
                id: id.to_owned(),
                confidence: 50,
                delay: Duration::ZERO,
                behavior,
                seen_token: Arc::default(),
            })
        }
    }

    #[async_trait]
    impl Provider for Fake {
        fn id(&self) -> &str {
            &self.id
        }

        fn confidence(&self) -> u8 {
            self.confidence
        }

        async fn complete(&self, _text: &str, ctx: &InvokeContext) -> Result<Completion, ProviderError> {
            *self.seen_token.lock().unwrap() = Some(ctx.cancel.clone());
            tokio::time::sleep(self.delay).await;

            match &self.behavior {
                Behavior::Answer { content, tokens } => Ok(Completion {
                    content: content.clone(),
                    tokens_used: Some(*tokens),
                }),
                Behavior::Fail(ErrorKind::Unauthorized) => Err(ProviderError::MissingCredential {
                    provider: self.id.clone(),
                }),
                Behavior::Fail(ErrorKind::Timeout) => Err(ProviderError::Timeout),
                Behavior::Fail(ErrorKind::Malformed) => Err(ProviderError::Malformed("bad json".to_owned())),
                Behavior::Fail(_) => Err(ProviderError::Transport("connection reset".to_owned())),
                Behavior::Hang => std::future::pending().await,
                Behavior::Block => {
                    // ignores both deadline and cancellation
                    std::thread::sleep(Duration::from_millis(600));
                    Err(ProviderError::Transport("blocked".to_owned()))
                }
                Behavior::Panic => panic!("adapter bug"),
            }
        }
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_owned()).collect()
    }

    fn request() -> Request {
        Request::new("Summarize the contract", Mode::Normal)
    }

    #[tokio::test(start_paused = true)]
    async fn one_outcome_per_id_in_request_order() {
        let dispatcher = Dispatcher::new([
            Fake::answering("slow", 60, 10, Duration::from_millis(300)),
            Fake::answering("fast", 80, 20, Duration::from_millis(10)),
            Fake::with("broken", Behavior::Fail(ErrorKind::Malformed)),
        ]);

        let outcomes = dispatcher
            .dispatch(
                &request(),
                &ids(&["slow", "broken", "fast"]),
                Duration::from_secs(5),
                &CancellationToken::new(),
            )
            .await;

        let order: Vec<_> = outcomes.iter().map(ProviderOutcome::provider_id).collect();
        assert_eq!(order, ["slow", "broken", "fast"]);
        assert!(outcomes[0].is_success());
        assert!(!outcomes[1].is_success());
        assert!(outcomes[2].is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_id_is_an_unknown_failure() {
        let dispatcher = Dispatcher::new([Fake::answering("a", 80, 5, Duration::ZERO)]);

        let outcomes = dispatcher
            .dispatch(&request(), &ids(&["a", "ghost"]), Duration::from_secs(1), &CancellationToken::new())
            .await;

        assert_eq!(outcomes.len(), 2);
        let ProviderOutcome::Failure(failure) = &outcomes[1] else {
            panic!("expected failure");
        };
        assert_eq!(failure.provider_id, "ghost");
        assert_eq!(failure.reason, ErrorKind::Unknown);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_provider_times_out_without_holding_others() {
        let dispatcher = Dispatcher::new([
            Fake::with("hung", Behavior::Hang),
            Fake::answering("ok", 70, 5, Duration::from_millis(50)),
        ]);

        let started = Instant::now();
        let outcomes = dispatcher
            .dispatch(&request(), &ids(&["hung", "ok"]), Duration::from_secs(2), &CancellationToken::new())
            .await;

        assert!(started.elapsed() <= Duration::from_secs(2) + ABORT_GRACE);
        let ProviderOutcome::Failure(failure) = &outcomes[0] else {
            panic!("expected failure");
        };
        assert_eq!(failure.reason, ErrorKind::Timeout);
        assert!(outcomes[1].is_success());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn non_yielding_task_is_aborted_after_grace() {
        let dispatcher = Dispatcher::new([Fake::with("stuck", Behavior::Block)]);

        let started = std::time::Instant::now();
        let outcomes = dispatcher
            .dispatch(&request(), &ids(&["stuck"]), Duration::from_millis(50), &CancellationToken::new())
            .await;

        assert!(started.elapsed() < Duration::from_millis(550));
        let ProviderOutcome::Failure(failure) = &outcomes[0] else {
            panic!("expected failure");
        };
        assert_eq!(failure.reason, ErrorKind::Timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_provider_is_isolated() {
        let dispatcher = Dispatcher::new([
            Fake::with("buggy", Behavior::Panic),
            Fake::answering("ok", 70, 5, Duration::ZERO),
        ]);

        let outcomes = dispatcher
            .dispatch(&request(), &ids(&["buggy", "ok"]), Duration::from_secs(1), &CancellationToken::new())
            .await;

        let ProviderOutcome::Failure(failure) = &outcomes[0] else {
            panic!("expected failure");
        };
        assert_eq!(failure.reason, ErrorKind::Unknown);
        assert!(outcomes[1].is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn caller_cancellation_stops_every_call() {
        let dispatcher = Dispatcher::new([Fake::with("a", Behavior::Hang), Fake::with("b", Behavior::Hang)]);
        let cancel = CancellationToken::new();

        let trigger = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                cancel.cancel();
            })
        };

        let started = Instant::now();
        let outcomes = dispatcher
            .dispatch(&request(), &ids(&["a", "b"]), Duration::from_secs(30), &cancel)
            .await;
        trigger.await.unwrap();

        assert!(started.elapsed() < Duration::from_secs(1));
        for outcome in &outcomes {
            let ProviderOutcome::Failure(failure) = outcome else {
                panic!("expected failure");
            };
            assert_eq!(failure.reason, ErrorKind::Timeout);
            assert!(failure.message.contains("cancelled"));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn enclosing_deadline_is_respected() {
        let dispatcher = Dispatcher::new([Fake::answering("late", 90, 5, Duration::from_secs(3))]);

        let outcomes = dispatcher
            .dispatch_until(
                &request(),
                &ids(&["late"]),
                Instant::now() + Duration::from_secs(1),
                &CancellationToken::new(),
            )
            .await;

        let ProviderOutcome::Failure(failure) = &outcomes[0] else {
            panic!("expected failure");
        };
        assert_eq!(failure.reason, ErrorKind::Timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_dispatch_cancels_in_flight_calls() {
        let hung = Arc::new(Fake {
            id: "hung".to_owned(),
            confidence: 50,
            delay: Duration::ZERO,
            behavior: Behavior::Hang,
            seen_token: Arc::default(),
        });
        let seen = Arc::clone(&hung.seen_token);
        let dispatcher = Dispatcher::new([hung as Arc<dyn Provider>]);

        let request = request();
        let ids = ids(&["hung"]);
        let abandoned = tokio::time::timeout(
            Duration::from_millis(100),
            dispatcher.dispatch(&request, &ids, Duration::from_secs(60), &CancellationToken::new()),
        )
        .await;
        assert!(abandoned.is_err());

        let token = seen.lock().unwrap().clone().expect("provider was invoked");
        assert!(token.is_cancelled());
    }
}
