//! Per-invocation deadline and cancellation

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Bounds threaded through every provider call
#[derive(Debug, Clone)]
pub struct InvokeContext {
    /// Instant after which the call is abandoned as timed out
    pub deadline: Instant,
    /// Fires when the caller gives up on the whole request
    pub cancel: CancellationToken,
}

impl InvokeContext {
    pub const fn new(deadline: Instant, cancel: CancellationToken) -> Self {
        Self { deadline, cancel }
    }

    /// Context expiring `timeout` from now with a fresh token
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new(Instant::now() + timeout, CancellationToken::new())
    }

    /// Time left before the deadline, zero once passed
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}
