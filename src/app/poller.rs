//! Confirmation polling.
//!
//! Turns the ledger's asynchronous submission model into a single awaited
//! result. Only "not yet observed" is retried; a transport failure while
//! polling ends the wait immediately.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::domain::{AppError, Confirmation, TrackedStatus, TransactionTracker, TransportError};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(60);

/// How often and how long to wait for a terminal status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// `None` waits forever (still cancellable)
    pub timeout: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: Some(DEFAULT_CONFIRMATION_TIMEOUT),
        }
    }
}

impl PollPolicy {
    #[must_use]
    pub fn bounded(interval: Duration, timeout: Duration) -> Self {
        Self {
            interval,
            timeout: Some(timeout),
        }
    }

    /// Poll until a terminal status or cancellation, with no deadline
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Waits for a submitted transaction to reach a terminal status
#[derive(Debug, Clone, Default)]
pub struct ConfirmationPoller {
    policy: PollPolicy,
}

impl ConfirmationPoller {
    #[must_use]
    pub fn new(policy: PollPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Query `tracker` until it reports success or failure.
    ///
    /// Returns [`TransportError::ConfirmationTimeout`] once the policy's
    /// timeout elapses and [`AppError::Cancelled`] when `cancel` fires. The
    /// interim "not found" state is never returned.
    #[instrument(skip(self, tracker, cancel))]
    pub async fn await_confirmation<T: TransactionTracker + ?Sized>(
        &self,
        tracker: &T,
        hash: &str,
        cancel: &CancellationToken,
    ) -> Result<Confirmation, AppError> {
        let started = Instant::now();
        let mut rounds: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(AppError::Cancelled(hash.to_string()));
            }

            match tracker.transaction_status(hash).await? {
                TrackedStatus::Success(record) => {
                    info!(hash = %hash, ledger = ?record.ledger, rounds, "Transaction confirmed");
                    return Ok(Confirmation::Success(record));
                }
                TrackedStatus::Failed(record) => {
                    warn!(hash = %hash, ledger = ?record.ledger, "Transaction failed on ledger");
                    return Ok(Confirmation::Failed(record));
                }
                TrackedStatus::NotFound => {}
            }

            let wait = match self.policy.timeout {
                Some(limit) => {
                    let elapsed = started.elapsed();
                    if elapsed >= limit {
                        return Err(AppError::Transport(TransportError::ConfirmationTimeout {
                            hash: hash.to_string(),
                            waited_secs: elapsed.as_secs(),
                        }));
                    }
                    self.policy.interval.min(limit - elapsed)
                }
                None => self.policy.interval,
            };

            rounds += 1;
            debug!(hash = %hash, rounds, "Transaction not yet observed");

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(AppError::Cancelled(hash.to_string()));
                }
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }
}
