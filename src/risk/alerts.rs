//! Threshold alerts and the bounded alert buffer

use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use std::collections::VecDeque;
use crate::config::RiskConfig;
use crate::types::{Alert, AlertCategory, AlertType};

#[derive(Debug, Clone, PartialEq)]
pub struct AlertThresholds {
    pub warning_ratio: Decimal,
    pub emergency_ratio: Decimal,
    pub max_portfolio_exposure: Decimal,
    pub max_drawdown: Decimal,
    pub max_daily_loss: Decimal,
}

impl From<&RiskConfig> for AlertThresholds {
    fn from(config: &RiskConfig) -> Self {
        Self {
            warning_ratio: config.alert_warning_ratio,
            emergency_ratio: config.alert_emergency_ratio,
            max_portfolio_exposure: config.max_portfolio_exposure,
            max_drawdown: config.max_drawdown,
            max_daily_loss: config.max_daily_loss,
        }
    }
}

impl AlertThresholds {
    /// Severity for a usage level expressed as a fraction of its limit.
    pub fn classify(&self, level: Decimal) -> Option<AlertType> {
        if level >= self.emergency_ratio {
            Some(AlertType::Emergency)
        } else if level >= self.warning_ratio {
            Some(AlertType::Warning)
        } else {
            None
        }
    }

    /// Builds an alert when `value` has reached a warning level of `limit`.
    pub fn evaluate(
        &self,
        category: AlertCategory,
        value: Decimal,
        limit: Decimal,
        now: DateTime<Utc>,
    ) -> Option<Alert> {
        if limit <= Decimal::ZERO {
            return None;
        }
        let level = value.checked_div(limit).unwrap_or(Decimal::MAX);
        let alert_type = self.classify(level)?;
        let label = match category {
            AlertCategory::Exposure => "Portfolio exposure",
            AlertCategory::Drawdown => "Drawdown",
            AlertCategory::DailyLoss => "Daily loss",
            AlertCategory::ExecutionFailure => "Execution failures",
        };
        Some(Alert {
            alert_type,
            category,
            message: format!(
                "{} at {:.1}% of limit ({} / {})",
                label,
                level.saturating_mul(Decimal::ONE_HUNDRED),
                value.round_dp(4),
                limit.round_dp(4)
            ),
            level,
            value,
            threshold: limit,
            timestamp: now,
        })
    }
}

/// Pure check of exposure and drawdown against their limits. `exposure_ratio`
/// is total exposure over total value; `drawdown` is a fraction of peak.
pub fn check_risk_alerts(
    exposure_ratio: Decimal,
    drawdown: Decimal,
    thresholds: &AlertThresholds,
    now: DateTime<Utc>,
) -> Vec<Alert> {
    [
        thresholds.evaluate(
            AlertCategory::Exposure,
            exposure_ratio,
            thresholds.max_portfolio_exposure,
            now,
        ),
        thresholds.evaluate(AlertCategory::Drawdown, drawdown, thresholds.max_drawdown, now),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Ring buffer of the most recent alerts.
#[derive(Debug, Clone)]
pub struct AlertBuffer {
    capacity: usize,
    alerts: VecDeque<Alert>,
}

impl AlertBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            alerts: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, alert: Alert) {
        if self.alerts.len() == self.capacity {
            self.alerts.pop_front();
        }
        self.alerts.push_back(alert);
    }

    /// Last `n` alerts, oldest first.
    pub fn recent(&self, n: usize) -> Vec<Alert> {
        let skip = self.alerts.len().saturating_sub(n);
        self.alerts.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn thresholds() -> AlertThresholds {
        AlertThresholds::from(&RiskConfig::default())
    }

    #[test]
    fn test_warning_and_emergency_levels() {
        let now = Utc::now();
        // exposure limit 0.8: 0.64 is exactly 80% of it
        let alerts = check_risk_alerts(dec!(0.64), dec!(0), &thresholds(), now);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::Warning);
        assert_eq!(alerts[0].category, AlertCategory::Exposure);
        assert_eq!(alerts[0].level, dec!(0.8));

        // drawdown limit 0.2: 0.19 is 95%
        let alerts = check_risk_alerts(dec!(0.1), dec!(0.19), &thresholds(), now);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::Emergency);
        assert_eq!(alerts[0].category, AlertCategory::Drawdown);
    }

    #[test]
    fn test_below_warning_is_quiet() {
        assert!(check_risk_alerts(dec!(0.63), dec!(0.15), &thresholds(), Utc::now()).is_empty());
    }

    #[test]
    fn test_buffer_keeps_most_recent() {
        let mut buffer = AlertBuffer::new(100);
        let t = thresholds();
        for i in 0..150 {
            let alert = t
                .evaluate(AlertCategory::Exposure, dec!(0.7) + Decimal::from(i) / dec!(10000), dec!(0.8), Utc::now())
                .unwrap();
            buffer.push(alert);
        }
        assert_eq!(buffer.len(), 100);
        let recent = buffer.recent(10);
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[9].value, dec!(0.7149));
        assert_eq!(recent[0].value, dec!(0.7140));
    }
}
