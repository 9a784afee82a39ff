//! Attempt-bounded, cancellable polling.
//!
//! [`poll_until`] owns the deadline and cancellation policy; the caller
//! supplies only the state check. That keeps the timeout behaviour testable
//! with a fake check and a paused tokio clock.
use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::{AppError, AppResult};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay before every status query, including the first.
    pub interval: Duration,
    /// Status queries allowed before giving up.
    pub max_attempts: u32,
    /// Failed queries tolerated before the job is abandoned. Each retry still
    /// consumes an attempt.
    pub query_retries: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        PollPolicy {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            query_retries: 0,
        }
    }
}

impl PollPolicy {
    /// Upper bound on the time spent waiting between queries.
    pub fn budget(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

#[derive(Debug, PartialEq)]
pub enum PollOutcome<T> {
    Done { value: T, attempts: u32 },
    Exhausted { attempts: u32 },
    Cancelled { attempts: u32 },
}

/// Wait, check, repeat until `check` yields `Some`, the attempt ceiling is
/// reached, or `cancel` fires. Errors from `check` end the loop unless they
/// are transport errors and retry budget remains.
pub async fn poll_until<T, F, Fut>(policy: &PollPolicy, cancel: &CancellationToken, mut check: F) -> AppResult<PollOutcome<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = AppResult<Option<T>>>,
{
    let mut attempts = 0;
    let mut retries_left = policy.query_retries;

    while attempts < policy.max_attempts {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(PollOutcome::Cancelled { attempts }),
            _ = tokio::time::sleep(policy.interval) => {}
        }

        attempts += 1;
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(PollOutcome::Cancelled { attempts }),
            r = check(attempts) => r,
        };

        match result {
            Ok(Some(value)) => return Ok(PollOutcome::Done { value, attempts }),
            Ok(None) => {}
            Err(err @ AppError::Transport { .. }) if retries_left > 0 => {
                retries_left -= 1;
                tracing::warn!(attempt = attempts, retries_left, error = %err, "Status query failed, retrying");
            }
            Err(err) => return Err(err),
        }
    }

    Ok(PollOutcome::Exhausted { attempts })
}
