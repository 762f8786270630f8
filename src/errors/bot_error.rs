//! Custom error types for the bot

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Price fetch failed: {message} (after {retry_count} attempts)")]
    TransientFetch {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
        retry_count: u32,
    },

    #[error("Invalid configuration for {field}: {message}")]
    Configuration {
        field: String,
        message: String,
    },

    #[error("Execution failed for {asset}: {reason}")]
    Execution {
        asset: String,
        reason: String,
    },

    #[error("Unknown position or trade: {id}")]
    UnknownPosition {
        id: String,
    },

    #[error("Data parsing error: {context}")]
    DataParsing {
        context: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error("Circuit breaker active: {reason}")]
    CircuitBreakerOpen {
        reason: String,
        cooldown_remaining: Duration,
    },
}

impl BotError {
    pub fn configuration(field: &str, message: impl Into<String>) -> Self {
        BotError::Configuration {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn execution(asset: impl ToString, reason: impl Into<String>) -> Self {
        BotError::Execution {
            asset: asset.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, BotError::TransientFetch { .. } | BotError::Transport { .. })
    }
}

pub type BotResult<T> = Result<T, BotError>;
