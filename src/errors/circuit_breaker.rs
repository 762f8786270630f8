//! Circuit breaker for the execution path

use std::time::{Duration, Instant};
use tracing::{error, info};
use super::{BotError, BotResult};

/// Opens after `max_consecutive_errors` gateway failures in a row and
/// blocks submissions until the cooldown has elapsed.
#[derive(Debug)]
pub struct CircuitBreaker {
    consecutive_errors: u32,
    max_consecutive_errors: u32,
    opened_at: Option<Instant>,
    cooldown_duration: Duration,
}

impl CircuitBreaker {
    pub fn new(max_consecutive_errors: u32, cooldown_secs: u64) -> Self {
        Self {
            consecutive_errors: 0,
            max_consecutive_errors: max_consecutive_errors.max(1),
            opened_at: None,
            cooldown_duration: Duration::from_secs(cooldown_secs),
        }
    }

    pub fn record_success(&mut self) {
        self.consecutive_errors = 0;
        self.opened_at = None;
    }

    /// Returns true when this error tripped the breaker.
    pub fn record_error(&mut self) -> bool {
        self.consecutive_errors += 1;

        if self.consecutive_errors >= self.max_consecutive_errors && self.opened_at.is_none() {
            self.opened_at = Some(Instant::now());
            error!("Circuit breaker OPEN after {} consecutive errors", self.consecutive_errors);
            return true;
        }
        false
    }

    pub fn is_open(&self) -> bool {
        self.opened_at.is_some()
    }

    pub fn consecutive_errors(&self) -> u32 {
        self.consecutive_errors
    }

    pub fn can_proceed(&mut self) -> bool {
        let Some(opened_at) = self.opened_at else {
            return true;
        };

        if opened_at.elapsed() >= self.cooldown_duration {
            info!("Circuit breaker cooldown complete, resetting");
            self.opened_at = None;
            self.consecutive_errors = 0;
            return true;
        }
        false
    }

    pub fn check(&mut self) -> BotResult<()> {
        if self.can_proceed() {
            return Ok(());
        }
        let remaining = self
            .opened_at
            .map(|t| self.cooldown_duration.saturating_sub(t.elapsed()))
            .unwrap_or_default();
        Err(BotError::CircuitBreakerOpen {
            reason: format!("{} consecutive execution failures", self.consecutive_errors),
            cooldown_remaining: remaining,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opens_after_threshold() {
        let mut breaker = CircuitBreaker::new(3, 300);
        assert!(!breaker.record_error());
        assert!(!breaker.record_error());
        assert!(breaker.record_error());
        assert!(breaker.is_open());
        assert!(!breaker.can_proceed());
        assert!(matches!(breaker.check(), Err(BotError::CircuitBreakerOpen { .. })));
    }

    #[test]
    fn test_success_resets_count() {
        let mut breaker = CircuitBreaker::new(2, 300);
        breaker.record_error();
        breaker.record_success();
        assert!(!breaker.record_error());
        assert!(breaker.can_proceed());
    }

    #[test]
    fn test_zero_cooldown_closes_immediately() {
        let mut breaker = CircuitBreaker::new(1, 0);
        assert!(breaker.record_error());
        assert!(breaker.can_proceed());
        assert_eq!(breaker.consecutive_errors(), 0);
        assert!(breaker.check().is_ok());
    }
}
