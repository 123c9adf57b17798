//! Retry with exponential backoff for fallible fetches.

use config::RetryConfig;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Runs an operation up to `max_attempts` times, doubling (or whatever
/// `multiplier` says) the pause between attempts. The final error is
/// returned to the caller unchanged.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    multiplier: f64,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration, multiplier: f64) -> Self {
        assert!(max_attempts > 0, "retry policy needs at least one attempt");
        Self {
            max_attempts,
            initial_delay,
            multiplier,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.initial_delay_ms),
            config.backoff_multiplier,
        )
    }

    /// Delay before retry number `attempt` (1-based), for logging and tests.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.initial_delay
            .mul_f64(self.multiplier.powi(attempt.saturating_sub(1) as i32))
    }

    /// Drives `operation` until it succeeds or attempts run out.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.max_attempts => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        "{label}: attempt {attempt}/{} failed: {err}; retrying in {delay:?}",
                        self.max_attempts
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
