//! Poll a remote object until it reaches an expected state.

use crate::error::{CloudError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep};

/// Verdict of one observation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// The expected state was reached
    Done,
    /// Still converging; poll again
    Pending,
    /// Settled in a state that will never become the expected one
    Failed(String),
}

/// Polls a refresh function with a fixed interval until a deadline
#[derive(Debug, Clone)]
pub struct Waiter {
    operation: String,
    timeout: Duration,
    interval: Duration,
    accept_absent: bool,
}

impl Waiter {
    pub fn new(operation: impl Into<String>, timeout: Duration) -> Self {
        Self {
            operation: operation.into(),
            timeout,
            interval: Duration::from_secs(3),
            accept_absent: false,
        }
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Treat a not-found refresh as reaching the target (used for deletion).
    pub fn accept_absent(mut self) -> Self {
        self.accept_absent = true;
        self
    }

    /// Poll `refresh` until `check` reports [`Progress::Done`].
    ///
    /// Returns the last observed object, or `None` when the object
    /// disappeared and absence was accepted.
    pub async fn until<S, F, Fut, C>(&self, mut refresh: F, check: C) -> Result<Option<S>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<S>>,
        C: Fn(&S) -> Progress,
    {
        let deadline = Instant::now() + self.timeout;

        loop {
            match refresh().await {
                Ok(object) => match check(&object) {
                    Progress::Done => return Ok(Some(object)),
                    Progress::Failed(reason) => {
                        return Err(CloudError::UnexpectedState(format!(
                            "{}: {reason}",
                            self.operation
                        )));
                    }
                    Progress::Pending => {}
                },
                Err(e) if e.is_not_found() && self.accept_absent => {
                    tracing::debug!(operation = %self.operation, "object is gone");
                    return Ok(None);
                }
                Err(e) => return Err(e),
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(CloudError::Timeout(format!(
                    "{} did not reach the expected state within {:?}",
                    self.operation, self.timeout
                )));
            }
            sleep(self.interval.min(deadline - now)).await;
        }
    }
}
