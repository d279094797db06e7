//! Per-call retry of throttling and service-busy faults.
//!
//! Unlike [`retry`](crate::retry::retry), which drives an operation to a
//! deadline, the invoker only smooths over short-lived API faults: each
//! catcher matches a set of error codes and retries them a fixed number of
//! times with a fixed wait.

use crate::error::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Codes to catch and how often to retry them
#[derive(Debug, Clone)]
pub struct Catcher {
    pub codes: Vec<String>,
    pub retry_count: u32,
    pub retry_wait: Duration,
}

impl Catcher {
    pub fn new(codes: &[&str], retry_count: u32, retry_wait: Duration) -> Self {
        Self {
            codes: codes.iter().map(|c| c.to_string()).collect(),
            retry_count,
            retry_wait,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Invoker {
    catchers: Vec<Catcher>,
}

impl Invoker {
    pub fn new(catchers: Vec<Catcher>) -> Self {
        Self { catchers }
    }

    /// Invoker that never retries
    pub fn passthrough() -> Self {
        Self::default()
    }

    pub async fn run<F, Fut, T>(&self, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        // Retries already spent per catcher
        let mut spent = vec![0u32; self.catchers.len()];

        loop {
            let err = match call().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            let caught = self.catchers.iter().enumerate().find(|(_, c)| {
                let codes: Vec<&str> = c.codes.iter().map(String::as_str).collect();
                err.matches_any(&codes)
            });

            match caught {
                Some((i, catcher)) if spent[i] < catcher.retry_count => {
                    spent[i] += 1;
                    tracing::debug!(
                        error = %err,
                        retry = spent[i],
                        max = catcher.retry_count,
                        "transient API fault, invoking again"
                    );
                    sleep(catcher.retry_wait).await;
                }
                _ => return Err(err),
            }
        }
    }
}
