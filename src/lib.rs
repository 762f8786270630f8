//! Cross-Venue Arbitrage Bot - spread detection with risk-gated execution
//!
//! Ingests quotes from several venues, validates them, detects and scores
//! cross-venue spreads, and routes eligible opportunities through a risk
//! manager before handing approved trades to an execution gateway.

pub mod config;
pub mod types;
pub mod errors;
pub mod network;
pub mod feeds;
pub mod validation;
pub mod arbitrage;
pub mod risk;
pub mod execution;
pub mod engine;
pub mod storage;
pub mod utils;

// Re-export commonly used items
pub use config::{Config, CONFIG};
pub use errors::{BotError, BotResult};
pub use types::*;
