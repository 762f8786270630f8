//! Portfolio risk metrics

use rust_decimal::prelude::*;
use crate::config::TRADING_DAYS_PER_YEAR;
use crate::types::Position;
use crate::utils::math::{mean, sample_std_dev};

/// Historical VaR: the magnitude of the return at the (1 - confidence)
/// quantile of the sorted series. `None` for an empty series.
pub fn calculate_var(returns: &[Decimal], confidence: Decimal) -> Option<Decimal> {
    if returns.is_empty() {
        return None;
    }
    let mut sorted = returns.to_vec();
    sorted.sort();

    let n = sorted.len();
    let index = ((Decimal::ONE - confidence) * Decimal::from(n))
        .floor()
        .to_usize()?
        .min(n - 1);
    Some(sorted[index].abs())
}

/// Per-period Sharpe ratio against a daily risk-free rate. Zero when the
/// series is too short or flat.
pub fn calculate_sharpe_ratio(returns: &[Decimal], risk_free_rate: Decimal) -> Option<Decimal> {
    let avg = mean(returns)?;
    if returns.len() < 2 {
        return Some(Decimal::ZERO);
    }
    let std_dev = sample_std_dev(returns)?;
    if std_dev.is_zero() {
        return Some(Decimal::ZERO);
    }
    let daily_rf = risk_free_rate / Decimal::from(TRADING_DAYS_PER_YEAR);
    Some((avg - daily_rf) / std_dev)
}

/// Largest peak-to-trough decline as a fraction of the peak.
pub fn calculate_max_drawdown(equity_curve: &[Decimal]) -> Option<Decimal> {
    let first = *equity_curve.first()?;
    let mut peak = first;
    let mut max_drawdown = Decimal::ZERO;
    for &value in equity_curve {
        if value > peak {
            peak = value;
        }
        if peak > Decimal::ZERO {
            max_drawdown = max_drawdown.max((peak - value) / peak);
        }
    }
    Some(max_drawdown)
}

/// Decline of the latest point from the running peak.
pub fn calculate_current_drawdown(equity_curve: &[Decimal]) -> Option<Decimal> {
    let last = *equity_curve.last()?;
    let peak = equity_curve.iter().copied().max()?;
    if peak <= Decimal::ZERO {
        return Some(Decimal::ZERO);
    }
    Some(((peak - last) / peak).max(Decimal::ZERO))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeStats {
    pub trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: Decimal,
    pub avg_win: Decimal,
    /// Negative, or zero without losses.
    pub avg_loss: Decimal,
    pub profit_factor: Decimal,
}

impl TradeStats {
    pub fn from_closed<'a>(positions: impl IntoIterator<Item = &'a Position>) -> Self {
        let mut stats = TradeStats::default();
        let mut gross_win = Decimal::ZERO;
        let mut gross_loss = Decimal::ZERO;

        for position in positions {
            stats.trades += 1;
            if position.pnl > Decimal::ZERO {
                stats.wins += 1;
                gross_win += position.pnl;
            } else if position.pnl < Decimal::ZERO {
                stats.losses += 1;
                gross_loss += position.pnl;
            }
        }

        if stats.trades > 0 {
            stats.win_rate = Decimal::from(stats.wins) / Decimal::from(stats.trades);
        }
        if stats.wins > 0 {
            stats.avg_win = gross_win / Decimal::from(stats.wins);
        }
        if stats.losses > 0 {
            stats.avg_loss = gross_loss / Decimal::from(stats.losses);
            stats.profit_factor = gross_win / gross_loss.abs();
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Asset, PositionSide, PositionStatus};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[test]
    fn test_var_picks_lower_quantile() {
        let returns: Vec<Decimal> = (1..=20).map(|i| Decimal::from(i - 10) / dec!(100)).collect();
        // floor(0.05 * 20) = 1 -> second-worst return, -0.08
        assert_eq!(calculate_var(&returns, dec!(0.95)), Some(dec!(0.08)));
        assert_eq!(calculate_var(&[], dec!(0.95)), None);
        assert_eq!(calculate_var(&[dec!(-0.02)], dec!(0.95)), Some(dec!(0.02)));
    }

    #[test]
    fn test_sharpe_degenerate_cases() {
        assert_eq!(calculate_sharpe_ratio(&[], dec!(0.02)), None);
        assert_eq!(calculate_sharpe_ratio(&[dec!(0.01)], dec!(0.02)), Some(dec!(0)));
        assert_eq!(calculate_sharpe_ratio(&[dec!(0.01), dec!(0.01)], dec!(0.02)), Some(dec!(0)));
    }

    #[test]
    fn test_sharpe_sign_follows_excess_return() {
        let good = calculate_sharpe_ratio(&[dec!(0.02), dec!(0.04), dec!(0.03)], dec!(0.02)).unwrap();
        let bad = calculate_sharpe_ratio(&[dec!(-0.02), dec!(-0.04), dec!(-0.03)], dec!(0.02)).unwrap();
        assert!(good > dec!(0));
        assert!(bad < dec!(0));
    }

    #[test]
    fn test_max_drawdown_scan() {
        let curve = [dec!(100), dec!(80), dec!(120), dec!(60)];
        assert_eq!(calculate_max_drawdown(&curve), Some(dec!(0.5)));
        assert_eq!(calculate_current_drawdown(&curve), Some(dec!(0.5)));
        assert_eq!(calculate_current_drawdown(&[dec!(100), dec!(90), dec!(110)]), Some(dec!(0)));
        assert_eq!(calculate_max_drawdown(&[]), None);
        assert_eq!(calculate_max_drawdown(&[dec!(100), dec!(105), dec!(130)]), Some(dec!(0)));
    }

    fn closed(pnl: Decimal) -> Position {
        Position {
            id: "p".into(),
            venue_position_id: None,
            asset: Asset::native("XLM").unwrap(),
            side: PositionSide::Long,
            size: dec!(1000),
            entry_price: dec!(1),
            current_price: dec!(1),
            stop_loss: dec!(0.95),
            take_profit: dec!(1.1),
            trailing_stop: dec!(0.97),
            status: PositionStatus::Closed,
            pnl,
            exit_reason: None,
            opened_at: Utc::now(),
            closed_at: Some(Utc::now()),
        }
    }

    #[test]
    fn test_trade_stats() {
        let positions = [closed(dec!(100)), closed(dec!(50)), closed(dec!(-30)), closed(dec!(-20))];
        let stats = TradeStats::from_closed(&positions);
        assert_eq!(stats.win_rate, dec!(0.5));
        assert_eq!(stats.avg_win, dec!(75));
        assert_eq!(stats.avg_loss, dec!(-25));
        assert_eq!(stats.profit_factor, dec!(3));

        let no_losses = TradeStats::from_closed(&[closed(dec!(10))]);
        assert_eq!(no_losses.profit_factor, dec!(0));
    }
}
