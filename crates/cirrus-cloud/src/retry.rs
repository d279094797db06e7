//! Bounded retry for remote calls with eventually-consistent effects.
//!
//! A mutating call is retried while the remote side reports a transient
//! conflict, and abandoned as soon as it reports anything else. Retries stop
//! at a fixed deadline rather than after a number of attempts.
//!
//! # Example
//!
//! ```ignore
//! use cirrus_cloud::retry::{retry_classified, RetryPolicy};
//!
//! let response = retry_classified(
//!     &RetryPolicy::with_timeout(Duration::from_secs(180)),
//!     "PublishRouteEntries",
//!     &["Operation.Blocking"],
//!     &[],
//!     || async { cen.publish_route_entries(&request).await },
//! ).await?;
//! ```

use crate::error::{CloudError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

/// How a failed remote call should be handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Transient conflict; try again
    Retryable,
    /// The remote object does not exist
    NotFound,
    /// Anything else; give up immediately
    Fatal,
}

/// Classify an error against an allow-list of retryable codes.
///
/// `not_found` names the codes that mean the object is gone for this call.
/// A [`CloudError::ResourceNotFound`] is always classified as not found.
pub fn classify(err: &CloudError, retryable: &[&str], not_found: &[&str]) -> ErrorClass {
    if err.matches_any(retryable) {
        ErrorClass::Retryable
    } else if err.is_not_found() || err.matches_any(not_found) {
        ErrorClass::NotFound
    } else {
        ErrorClass::Fatal
    }
}

/// Outcome of a single attempt that did not succeed
#[derive(Debug)]
pub enum RetryError {
    Retryable(CloudError),
    NonRetryable(CloudError),
}

impl RetryError {
    pub fn into_inner(self) -> CloudError {
        match self {
            RetryError::Retryable(e) | RetryError::NonRetryable(e) => e,
        }
    }
}

/// Retry configuration for provider operations
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Overall deadline for all attempts
    pub timeout: Duration,

    /// Initial delay between retries
    pub initial_delay: Duration,

    /// Maximum delay between retries
    pub max_delay: Duration,

    /// Backoff multiplier
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3 * 60),
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Default::default()
        }
    }

    /// Delay before the attempt following `attempt` (zero-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(attempt as i32);
        let delay = self.initial_delay.as_secs_f64() * factor;
        Duration::from_secs_f64(delay.min(self.max_delay.as_secs_f64()))
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// the policy's deadline passes.
///
/// On timeout the last retryable error is reported as [`CloudError::Timeout`].
pub async fn retry<F, Fut, T>(policy: &RetryPolicy, operation_name: &str, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, RetryError>>,
{
    let deadline = Instant::now() + policy.timeout;
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(RetryError::NonRetryable(e)) => {
                debug!(operation = %operation_name, attempt, error = %e, "non-retryable error");
                return Err(e);
            }
            Err(RetryError::Retryable(e)) => {
                let now = Instant::now();
                if now >= deadline {
                    return Err(CloudError::Timeout(format!(
                        "{operation_name} did not succeed within {:?}; last error: {e}",
                        policy.timeout
                    )));
                }

                let delay = policy.delay_for_attempt(attempt).min(deadline - now);
                warn!(
                    operation = %operation_name,
                    attempt,
                    error = %e,
                    delay_ms = delay.as_millis() as u64,
                    "retryable error, retrying"
                );
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// [`retry`] with the retry decision made by [`classify`].
///
/// Errors matching `retryable` are retried. Errors matching `not_found` are
/// returned as [`CloudError::ResourceNotFound`], every other error unchanged.
pub async fn retry_classified<F, Fut, T>(
    policy: &RetryPolicy,
    operation_name: &str,
    retryable: &[&str],
    not_found: &[&str],
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    retry(policy, operation_name, || {
        let attempt = operation();
        async move {
            attempt.await.map_err(|e| match classify(&e, retryable, not_found) {
                ErrorClass::Retryable => RetryError::Retryable(e),
                ErrorClass::NotFound => RetryError::NonRetryable(e.not_found_on(not_found)),
                ErrorClass::Fatal => RetryError::NonRetryable(e),
            })
        }
    })
    .await
}
