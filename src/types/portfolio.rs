//! Portfolio aggregate

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Portfolio {
    pub total_value: Decimal,
    pub available_capital: Decimal,
    pub total_exposure: Decimal,
    pub unrealized_pnl: Decimal,
    pub realized_pnl: Decimal,
}

impl Portfolio {
    pub fn with_capital(capital: Decimal) -> Self {
        Self {
            total_value: capital,
            available_capital: capital,
            ..Default::default()
        }
    }

    /// Exposure as a fraction of total value; zero when the portfolio is empty.
    pub fn exposure_ratio(&self) -> Decimal {
        if self.total_value <= Decimal::ZERO {
            Decimal::ZERO
        } else {
            self.total_exposure
                .checked_div(self.total_value)
                .unwrap_or(Decimal::MAX)
        }
    }
}
