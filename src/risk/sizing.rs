//! Position sizing: fractional Kelly and fixed-fractional

use rust_decimal::prelude::*;
use crate::config::RiskConfig;

#[derive(Debug, Clone)]
pub struct PositionSizer {
    kelly_fraction: Decimal,
    fixed_fractional: Decimal,
    max_position_size: Decimal,
}

impl PositionSizer {
    pub fn new(config: &RiskConfig) -> Self {
        Self {
            kelly_fraction: config.kelly_fraction,
            fixed_fractional: config.fixed_fractional,
            max_position_size: config.max_position_size,
        }
    }

    /// Kelly stake scaled by the configured fraction and capped at the
    /// maximum position size. `avg_loss` may be given signed.
    pub fn calculate_kelly_position(
        &self,
        win_rate: Decimal,
        avg_win: Decimal,
        avg_loss: Decimal,
        capital: Decimal,
    ) -> Decimal {
        if avg_loss.is_zero() || capital <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let b = avg_win / avg_loss.abs();
        if b <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let kelly = (win_rate * b - (Decimal::ONE - win_rate)) / b;
        let stake = kelly.max(Decimal::ZERO) * self.kelly_fraction * capital;
        stake.min(self.max_position_size * capital)
    }

    /// Size such that hitting the stop loses `fixed_fractional` of capital.
    pub fn calculate_fixed_fractional_position(
        &self,
        capital: Decimal,
        stop_loss_distance: Decimal,
    ) -> Decimal {
        if stop_loss_distance <= Decimal::ZERO || capital <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        capital * self.fixed_fractional / stop_loss_distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sizer() -> PositionSizer {
        PositionSizer::new(&RiskConfig::default())
    }

    #[test]
    fn test_kelly_with_default_priors() {
        // b = 2, k = (0.6*2 - 0.4)/2 = 0.4, quarter Kelly = 0.1 of capital
        let size = sizer().calculate_kelly_position(dec!(0.6), dec!(100), dec!(-50), dec!(10000));
        assert_eq!(size, dec!(1000));
    }

    #[test]
    fn test_kelly_is_capped() {
        let size = sizer().calculate_kelly_position(dec!(0.9), dec!(300), dec!(50), dec!(10000));
        assert_eq!(size, dec!(1000));
    }

    #[test]
    fn test_negative_edge_and_zero_loss() {
        let s = sizer();
        assert_eq!(s.calculate_kelly_position(dec!(0.3), dec!(50), dec!(-100), dec!(10000)), dec!(0));
        assert_eq!(s.calculate_kelly_position(dec!(0.6), dec!(100), dec!(0), dec!(10000)), dec!(0));
    }

    #[test]
    fn test_fixed_fractional() {
        let s = sizer();
        assert_eq!(s.calculate_fixed_fractional_position(dec!(10000), dec!(0.05)), dec!(4000));
        assert_eq!(s.calculate_fixed_fractional_position(dec!(10000), dec!(0)), dec!(0));
    }
}
