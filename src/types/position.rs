//! Position lifecycle types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use super::Asset;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionSide {
    Long,
    Short,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionStatus {
    Open,
    Stopped,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    StopLoss,
    TrailingStop,
    TakeProfit,
    Manual,
}

/// A filled position. `size` is notional in capital units at entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Internal id, the id of the approved trade that opened it.
    pub id: String,
    /// The gateway's reference for the fill, if it returned one.
    pub venue_position_id: Option<String>,
    pub asset: Asset,
    pub side: PositionSide,
    pub size: Decimal,
    pub entry_price: Decimal,
    pub current_price: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub trailing_stop: Decimal,
    pub status: PositionStatus,
    pub pnl: Decimal,
    pub exit_reason: Option<ExitReason>,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Position {
    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }

    /// P&L of the notional at `price`. Saturates instead of overflowing on
    /// extreme price ratios.
    pub fn pnl_at(&self, price: Decimal) -> Decimal {
        if self.entry_price.is_zero() {
            return Decimal::ZERO;
        }
        let notional = match self.side {
            PositionSide::Long => self.size,
            PositionSide::Short => -self.size,
        };
        let diff = price.saturating_sub(self.entry_price);
        diff.checked_div(self.entry_price)
            .and_then(|change| notional.checked_mul(change))
            .unwrap_or_else(|| {
                if diff.is_sign_negative() == notional.is_sign_negative() {
                    Decimal::MAX
                } else {
                    Decimal::MIN
                }
            })
    }

    /// Fractional return on the notional.
    pub fn return_fraction(&self) -> Decimal {
        if self.size.is_zero() {
            Decimal::ZERO
        } else {
            self.pnl / self.size
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn long(size: Decimal, entry: Decimal) -> Position {
        let now = Utc::now();
        Position {
            id: "p".into(),
            venue_position_id: None,
            asset: Asset::native("XLM").unwrap(),
            side: PositionSide::Long,
            size,
            entry_price: entry,
            current_price: entry,
            stop_loss: Decimal::ZERO,
            take_profit: Decimal::MAX,
            trailing_stop: Decimal::ZERO,
            status: PositionStatus::Open,
            pnl: Decimal::ZERO,
            exit_reason: None,
            opened_at: now,
            closed_at: None,
        }
    }

    #[test]
    fn test_pnl_on_notional() {
        let position = long(dec!(400), dec!(100));
        assert_eq!(position.pnl_at(dec!(60)), dec!(-160));
        assert_eq!(position.pnl_at(dec!(110)), dec!(40));
    }

    #[test]
    fn test_pnl_saturates_on_extreme_ratio() {
        let position = long(dec!(4000), Decimal::new(1, 26));
        assert_eq!(position.pnl_at(dec!(100000)), Decimal::MAX);
    }
}
