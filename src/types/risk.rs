//! Risk metrics, alerts and status snapshot types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use super::{Asset, Portfolio, Position};
use crate::config::RiskConfig;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RiskMetrics {
    pub var_95: Decimal,
    pub sharpe_ratio: Decimal,
    pub max_drawdown: Decimal,
    pub current_drawdown: Decimal,
    pub win_rate: Decimal,
    pub avg_win: Decimal,
    pub avg_loss: Decimal,
    pub profit_factor: Decimal,
    pub execution_failures: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum AlertType {
    Warning,
    Emergency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AlertCategory {
    Exposure,
    Drawdown,
    ExecutionFailure,
    DailyLoss,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub alert_type: AlertType,
    pub category: AlertCategory,
    pub message: String,
    /// Fraction of the configured limit that has been reached.
    pub level: Decimal,
    pub value: Decimal,
    pub threshold: Decimal,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExposureLimit {
    TotalPortfolio {
        current: Decimal,
        proposed: Decimal,
        limit: Decimal,
    },
    SingleAsset {
        asset: Asset,
        current: Decimal,
        proposed: Decimal,
        limit: Decimal,
    },
}

impl fmt::Display for ExposureLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExposureLimit::TotalPortfolio { current, proposed, limit } => write!(
                f,
                "portfolio exposure {} + {} exceeds limit {}",
                current, proposed, limit
            ),
            ExposureLimit::SingleAsset { asset, current, proposed, limit } => write!(
                f,
                "{} exposure {} + {} exceeds limit {}",
                asset, current, proposed, limit
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExposureCheck {
    pub passed: bool,
    pub failures: Vec<ExposureLimit>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExposureSummary {
    pub total: Decimal,
    pub ratio: Decimal,
    pub limit: Decimal,
}

/// Point-in-time view of the risk engine for dashboards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskStatus {
    pub portfolio: Portfolio,
    pub metrics: RiskMetrics,
    pub exposure: ExposureSummary,
    pub open_positions: Vec<Position>,
    pub alerts: Vec<Alert>,
    pub config: RiskConfig,
}
