//! Trade execution types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use super::{Asset, PositionSide, Venue};

/// Order handed to the external execution gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub asset: Asset,
    pub buy_venue: Venue,
    pub sell_venue: Venue,
    pub buy_price: Decimal,
    pub sell_price: Decimal,
    pub size: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResponse {
    pub accepted: bool,
    #[serde(default)]
    pub position_id: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl ExecutionResponse {
    pub fn filled(position_id: impl Into<String>) -> Self {
        Self {
            accepted: true,
            position_id: Some(position_id.into()),
            reason: None,
        }
    }

    pub fn declined(reason: impl Into<String>) -> Self {
        Self {
            accepted: false,
            position_id: None,
            reason: Some(reason.into()),
        }
    }
}

/// A trade that passed every risk gate; its exposure stays reserved until
/// the gateway answers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApprovedTrade {
    pub id: String,
    pub opportunity_id: String,
    pub side: PositionSide,
    pub request: ExecutionRequest,
    pub approved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExecutionStatus {
    Filled,
    Declined,
}

/// Record of a gateway round-trip, persisted for the dashboard feed.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionOutcome {
    pub trade_id: String,
    pub opportunity_id: String,
    pub asset: Asset,
    pub timestamp: DateTime<Utc>,
    pub status: ExecutionStatus,
    pub position_id: Option<String>,
    pub size: Decimal,
    pub execution_time_ms: u64,
    pub error_message: Option<String>,
}
