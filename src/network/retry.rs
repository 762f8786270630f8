//! Bounded retry with linear or exponential backoff

use std::future::Future;
use std::time::Duration;
use anyhow::Result;
use tracing::warn;
use crate::config::FeedConfig;
use crate::errors::{BotError, BotResult};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    Linear,
    Exponential { base: f64 },
}

/// One policy shared by every outbound call site.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff: Backoff,
    pub attempt_timeout: Duration,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_millis(5000),
            backoff: Backoff::Exponential { base: 2.0 },
            attempt_timeout: Duration::from_secs(5),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &FeedConfig) -> Self {
        Self {
            max_attempts: config.fetch_max_attempts.max(1),
            initial_delay: Duration::from_millis(config.retry_initial_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
            attempt_timeout: Duration::from_secs(config.fetch_timeout_secs),
            ..Default::default()
        }
    }

    /// Delay before retry number `attempt` (1-based), without jitter.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let initial = self.initial_delay.as_millis() as f64;
        let step = attempt.saturating_sub(1) as f64;
        let millis = match self.backoff {
            Backoff::Linear => initial * (step + 1.0),
            Backoff::Exponential { base } => initial * base.powf(step),
        };
        let capped = millis.min(self.max_delay.as_millis() as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }

    fn jittered(&self, delay: Duration) -> Duration {
        if !self.jitter {
            return delay;
        }
        // +/- 5%
        let factor = 1.0 + 0.1 * (rand::random::<f64>() - 0.5);
        Duration::from_millis((delay.as_millis() as f64 * factor) as u64)
    }

    /// Runs `operation` until it succeeds or attempts are exhausted. Each
    /// attempt is bounded by `attempt_timeout`.
    pub async fn run<F, Fut, T>(&self, operation: F, context: &str) -> BotResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;

            let result = match tokio::time::timeout(self.attempt_timeout, operation()).await {
                Ok(result) => result,
                Err(_) => Err(anyhow::anyhow!(
                    "timed out after {}ms",
                    self.attempt_timeout.as_millis()
                )),
            };

            match result {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= self.max_attempts => {
                    return Err(BotError::TransientFetch {
                        message: format!("{} failed after {} attempts", context, attempt),
                        source: Some(e),
                        retry_count: attempt,
                    });
                }
                Err(e) => {
                    let delay = self.jittered(self.delay_for(attempt));
                    warn!(
                        "Attempt {}/{} failed for {}: {}. Retrying in {}ms...",
                        attempt,
                        self.max_attempts,
                        context,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

pub async fn retry_with_backoff<F, Fut, T>(
    operation: F,
    policy: &RetryPolicy,
    context: &str,
) -> BotResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    policy.run(operation, context).await
}
