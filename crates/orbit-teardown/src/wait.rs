//! Condition polling with exponential backoff and a hard deadline.
//!
//! Provides a generic abstraction for waiting on a CloudControl resource (or
//! any async condition) to reach a state, with jittered exponential backoff
//! between checks. Time is measured with `tokio::time` so paused-clock tests
//! run instantly.

use backon::{BackoffBuilder, ExponentialBuilder};
use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Configuration for resource waiting with exponential backoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitConfig {
    /// Initial delay between checks
    pub initial_delay: Duration,
    /// Maximum delay between checks (cap for exponential growth)
    pub max_delay: Duration,
    /// Maximum total time to wait before timeout
    pub timeout: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        use orbit_common::defaults::{
            DEFAULT_POLL_INITIAL_DELAY_MS, DEFAULT_POLL_MAX_DELAY_MS, DEFAULT_WAIT_TIMEOUT_SECS,
        };

        Self {
            initial_delay: Duration::from_millis(DEFAULT_POLL_INITIAL_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_POLL_MAX_DELAY_MS),
            timeout: Duration::from_secs(DEFAULT_WAIT_TIMEOUT_SECS),
        }
    }
}

/// Why a wait ended without the condition holding
#[derive(Debug, Error)]
pub enum WaitError<E> {
    /// The deadline passed first
    #[error("timed out after {timeout:?} ({attempts} attempts)")]
    Timeout { timeout: Duration, attempts: u32 },

    /// The check itself failed
    #[error("check failed: {0:?}")]
    Check(E),
}

/// Wait for a condition to hold, polling with exponential backoff.
///
/// `check` returns `Ok(true)` when done, `Ok(false)` to poll again, and
/// `Err` to stop immediately. The deadline covers both the checks and the
/// sleeps between them; a check still running at the deadline is abandoned.
pub async fn wait_for_resource<F, Fut, E>(
    config: &WaitConfig,
    mut check: F,
    resource_name: &str,
) -> Result<(), WaitError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: Debug,
{
    let deadline = Instant::now() + config.timeout;
    let mut attempts = 0u32;

    let backoff = ExponentialBuilder::default()
        .with_min_delay(config.initial_delay)
        .with_max_delay(config.max_delay)
        .with_factor(2.0)
        .with_jitter()
        .build();

    let mut delays = backoff.into_iter();

    let outcome = tokio::time::timeout_at(deadline, async {
        loop {
            attempts += 1;

            match check().await {
                Ok(true) => {
                    debug!(resource = %resource_name, attempts, "Resource ready");
                    return Ok(());
                }
                Ok(false) => {
                    let delay = delays.next().unwrap_or(config.max_delay);
                    debug!(
                        resource = %resource_name,
                        attempt = attempts,
                        delay_ms = delay.as_millis(),
                        "Resource not ready, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    warn!(resource = %resource_name, error = ?e, "Resource check failed");
                    return Err(WaitError::Check(e));
                }
            }
        }
    })
    .await;

    match outcome {
        Ok(result) => result,
        Err(_) => {
            warn!(
                resource = %resource_name,
                timeout_secs = config.timeout.as_secs(),
                attempts,
                "Timed out waiting for resource"
            );
            Err(WaitError::Timeout {
                timeout: config.timeout,
                attempts,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config(timeout: Duration) -> WaitConfig {
        WaitConfig {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(1),
            timeout,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_on_first_check() {
        let calls = AtomicU32::new(0);
        let result: Result<(), WaitError<String>> = wait_for_resource(
            &fast_config(Duration::from_secs(5)),
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(true) }
            },
            "test",
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_after_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<(), WaitError<String>> = wait_for_resource(
            &fast_config(Duration::from_secs(60)),
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move { Ok(n >= 4) }
            },
            "test",
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out() {
        let start = Instant::now();
        let result: Result<(), WaitError<String>> = wait_for_resource(
            &fast_config(Duration::from_secs(10)),
            || async { Ok(false) },
            "never-ready",
        )
        .await;

        match result {
            Err(WaitError::Timeout { timeout, attempts }) => {
                assert_eq!(timeout, Duration::from_secs(10));
                assert!(attempts > 1);
            }
            other => panic!("Expected timeout, got {other:?}"),
        }
        assert!(start.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_error_stops_immediately() {
        let calls = AtomicU32::new(0);
        let result = wait_for_resource(
            &fast_config(Duration::from_secs(60)),
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<bool, _>("boom".to_string()) }
            },
            "broken",
        )
        .await;

        assert!(matches!(result, Err(WaitError::Check(ref e)) if e == "boom"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_default_timeout_is_five_minutes() {
        assert_eq!(WaitConfig::default().timeout, Duration::from_secs(300));
    }
}
