//! Bounded polling.

use std::time::Duration;

use thiserror::Error;
use tokio::time::{self, MissedTickBehavior};

/// Polling bounds for [`wait_for`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Give up after this long.
    pub timeout: Duration,
    /// Delay between predicate checks.
    pub poll_interval: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(10),
        }
    }
}

impl WaitOptions {
    /// Options with a custom timeout.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }
}

/// Wait error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WaitError {
    #[error("Timed out after {0:?}")]
    TimedOut(Duration),
}

/// Resolve with the first `Some` returned by `predicate`.
///
/// The predicate is checked immediately, then once per poll interval.
///
/// # Errors
/// Returns [`WaitError::TimedOut`] if the predicate has not yielded within
/// the timeout.
pub async fn wait_for<T, F>(mut predicate: F, options: WaitOptions) -> Result<T, WaitError>
where
    F: FnMut() -> Option<T>,
{
    let poll = async {
        let mut ticks = time::interval(options.poll_interval.max(Duration::from_millis(1)));
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticks.tick().await;
            if let Some(value) = predicate() {
                return value;
            }
        }
    };

    time::timeout(options.timeout, poll)
        .await
        .map_err(|_| WaitError::TimedOut(options.timeout))
}
