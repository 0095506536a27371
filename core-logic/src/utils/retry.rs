//! Bounded retry with a constant delay between attempts.
//!
//! The delay does not grow between attempts. Every network call of a sender
//! goes through [`RetryExecutor::execute`], so a flaky RPC endpoint costs at
//! most `max_attempts * delay` per call.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total number of invocations, including the first one
    pub max_attempts: u32,
    /// Pause between two attempts in milliseconds
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay_ms: 5000,
        }
    }
}

impl RetryConfig {
    pub fn new(max_attempts: u32, delay_ms: u64) -> Self {
        Self {
            max_attempts,
            delay_ms,
        }
    }

    /// Single attempt, no waiting
    pub fn no_retry() -> Self {
        Self::new(1, 0)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// A zero cap still runs the operation once.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RetryExecutor {
    config: RetryConfig,
}

impl RetryExecutor {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Runs `operation` until it succeeds or the attempt cap is reached.
    ///
    /// Each failed attempt except the last logs one warning line and sleeps
    /// for the configured delay. The error of the last attempt is returned
    /// as-is.
    pub async fn execute<T, E, F, Fut>(&self, operation_name: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let max_attempts = self.config.attempts();
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(result) => {
                    if attempt > 1 {
                        debug!("{} succeeded on attempt {}", operation_name, attempt);
                    }
                    return Ok(result);
                }
                Err(e) if attempt >= max_attempts => {
                    debug!(
                        "{} failed after {} attempts: {}",
                        operation_name, max_attempts, e
                    );
                    return Err(e);
                }
                Err(e) => {
                    warn!(
                        "{} failed: {}. Retrying... ({}/{})",
                        operation_name, e, attempt, max_attempts
                    );
                    tokio::time::sleep(self.config.delay()).await;
                    attempt += 1;
                }
            }
        }
    }
}
