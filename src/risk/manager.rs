//! Risk manager: gates opportunities and tracks the resulting positions
//!
//! Lifecycle of a trade: an opportunity is evaluated and either rejected or
//! approved. Approval reserves exposure until the gateway answers; a fill
//! opens a position, a decline releases the reservation. Open positions are
//! marked on every accepted price and leave through a stop, a take-profit
//! or a manual close.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use tracing::{debug, error, info, warn};
use crate::{
    config::{RiskConfig, RECENT_ALERTS},
    errors::{BotError, BotResult},
    types::{
        Alert, AlertCategory, AlertType, ApprovedTrade, Asset, ExecutionRequest, ExecutionResponse,
        ExitReason, ExposureLimit, ExposureSummary, Opportunity, Portfolio, Position,
        PositionSide, PositionStatus, RiskMetrics, RiskStatus,
    },
};
use super::{
    calculate_current_drawdown, calculate_max_drawdown, calculate_sharpe_ratio, calculate_var,
    check_exposure_limits, check_risk_alerts, AlertBuffer, AlertThresholds, ExposureBook,
    PositionSizer, TradeStats,
};

/// Closed positions kept for trade statistics, in days.
const CLOSED_HISTORY_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RejectReason {
    InvalidPrice,
    DailyLossLimit { daily_pnl: Decimal, limit: Decimal },
    MaxConcurrentPositions { open: usize, max: usize },
    LossCooldown { remaining_secs: i64 },
    ZeroSize,
    Exposure(ExposureLimit),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::InvalidPrice => write!(f, "opportunity has a non-positive buy price"),
            RejectReason::DailyLossLimit { daily_pnl, limit } => {
                write!(f, "daily loss limit of {} reached (P&L {})", limit, daily_pnl)
            }
            RejectReason::MaxConcurrentPositions { open, max } => {
                write!(f, "maximum concurrent trades reached ({}/{})", open, max)
            }
            RejectReason::LossCooldown { remaining_secs } => {
                write!(f, "in cooldown for {} more seconds", remaining_secs)
            }
            RejectReason::ZeroSize => write!(f, "position size rounds to zero"),
            RejectReason::Exposure(limit) => write!(f, "{}", limit),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeRejection {
    pub opportunity_id: String,
    pub reasons: Vec<RejectReason>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TradeDecision {
    Approved(ApprovedTrade),
    Rejected(TradeRejection),
}

impl TradeDecision {
    pub fn approved(&self) -> Option<&ApprovedTrade> {
        match self {
            TradeDecision::Approved(trade) => Some(trade),
            TradeDecision::Rejected(_) => None,
        }
    }
}

pub struct RiskManager {
    config: RiskConfig,
    sizer: PositionSizer,
    thresholds: AlertThresholds,
    portfolio: Portfolio,
    metrics: RiskMetrics,
    exposure: ExposureBook,
    pending: HashMap<String, ApprovedTrade>,
    positions: BTreeMap<String, Position>,
    closed: VecDeque<Position>,
    returns: VecDeque<Decimal>,
    equity_curve: Vec<Decimal>,
    alerts: AlertBuffer,
    active_levels: HashMap<AlertCategory, AlertType>,
    unpublished: Vec<Alert>,
    daily_pnl: Decimal,
    last_loss_at: Option<DateTime<Utc>>,
}

impl RiskManager {
    pub fn new(config: RiskConfig) -> Self {
        let sizer = PositionSizer::new(&config);
        let thresholds = AlertThresholds::from(&config);
        let portfolio = Portfolio::with_capital(config.initial_capital);
        let alerts = AlertBuffer::new(config.alert_capacity);
        let equity_curve = vec![config.initial_capital];

        Self {
            config,
            sizer,
            thresholds,
            portfolio,
            metrics: RiskMetrics::default(),
            exposure: ExposureBook::default(),
            pending: HashMap::new(),
            positions: BTreeMap::new(),
            closed: VecDeque::new(),
            returns: VecDeque::new(),
            equity_curve,
            alerts,
            active_levels: HashMap::new(),
            unpublished: Vec::new(),
            daily_pnl: Decimal::ZERO,
            last_loss_at: None,
        }
    }

    /// Runs pre-trade guards, sizes the trade and checks exposure. On
    /// approval the size is reserved until `handle_execution_result`.
    pub fn evaluate_trade_opportunity(
        &mut self,
        opportunity: &Opportunity,
        correlation_factor: Decimal,
        now: DateTime<Utc>,
    ) -> TradeDecision {
        let reject = |reasons: Vec<RejectReason>| {
            debug!(
                opportunity_id = %opportunity.id,
                reasons = ?reasons,
                "Trade rejected"
            );
            TradeDecision::Rejected(TradeRejection {
                opportunity_id: opportunity.id.clone(),
                reasons,
            })
        };

        if opportunity.buy_price <= Decimal::ZERO {
            return reject(vec![RejectReason::InvalidPrice]);
        }

        let guards = self.guard_reasons(now);
        if !guards.is_empty() {
            return reject(guards);
        }

        let size = self.position_size(&opportunity.asset, correlation_factor);
        if size <= Decimal::ZERO {
            return reject(vec![RejectReason::ZeroSize]);
        }

        let check = check_exposure_limits(
            &self.exposure,
            &opportunity.asset,
            size,
            self.portfolio.total_value,
            &self.config,
        );
        if !check.passed {
            return reject(check.failures.into_iter().map(RejectReason::Exposure).collect());
        }

        let side = PositionSide::Long;
        let (stop_loss, take_profit) = self.bracket(side, opportunity.buy_price);
        let trade = ApprovedTrade {
            id: uuid::Uuid::new_v4().to_string(),
            opportunity_id: opportunity.id.clone(),
            side,
            request: ExecutionRequest {
                asset: opportunity.asset.clone(),
                buy_venue: opportunity.buy_venue.clone(),
                sell_venue: opportunity.sell_venue.clone(),
                buy_price: opportunity.buy_price,
                sell_price: opportunity.sell_price,
                size,
                stop_loss,
                take_profit,
            },
            approved_at: now,
        };

        self.exposure.reserve(&opportunity.asset, size);
        self.pending.insert(trade.id.clone(), trade.clone());
        self.update_portfolio();
        self.update_risk_metrics();

        info!(
            trade_id = %trade.id,
            asset = %opportunity.asset,
            size = %size,
            stop_loss = %stop_loss,
            take_profit = %take_profit,
            "Trade approved"
        );
        TradeDecision::Approved(trade)
    }

    /// min(Kelly, fixed-fractional, asset headroom) shrunk by correlation.
    fn position_size(&self, asset: &Asset, correlation_factor: Decimal) -> Decimal {
        let capital = self.portfolio.available_capital;
        let (win_rate, avg_win, avg_loss) = self.kelly_inputs();

        let kelly = self.sizer.calculate_kelly_position(win_rate, avg_win, avg_loss, capital);
        let fixed = self
            .sizer
            .calculate_fixed_fractional_position(capital, self.config.default_stop_loss);

        let headroom = (self.config.max_single_asset_exposure * self.portfolio.total_value
            - self.exposure.asset(asset))
        .max(Decimal::ZERO);

        let size = kelly.min(fixed).min(headroom) / correlation_factor.max(Decimal::ONE);
        size.round_dp(8)
    }

    /// Observed trade statistics once there are enough of both outcomes,
    /// configured priors before that.
    fn kelly_inputs(&self) -> (Decimal, Decimal, Decimal) {
        let observed = self.closed.len() >= self.config.min_trades_for_kelly
            && !self.metrics.avg_win.is_zero()
            && !self.metrics.avg_loss.is_zero();
        if observed {
            (self.metrics.win_rate, self.metrics.avg_win, self.metrics.avg_loss)
        } else {
            (
                self.config.prior_win_rate,
                self.config.prior_avg_win,
                self.config.prior_avg_loss,
            )
        }
    }

    fn bracket(&self, side: PositionSide, entry: Decimal) -> (Decimal, Decimal) {
        let sl = self.config.default_stop_loss;
        let tp = self.config.default_take_profit;
        match side {
            PositionSide::Long => (entry * (Decimal::ONE - sl), entry * (Decimal::ONE + tp)),
            PositionSide::Short => (entry * (Decimal::ONE + sl), entry * (Decimal::ONE - tp)),
        }
    }

    fn initial_trailing_stop(&self, side: PositionSide, price: Decimal) -> Decimal {
        match side {
            PositionSide::Long => price * (Decimal::ONE - self.config.trailing_stop),
            PositionSide::Short => price * (Decimal::ONE + self.config.trailing_stop),
        }
    }

    fn guard_reasons(&self, now: DateTime<Utc>) -> Vec<RejectReason> {
        let mut reasons = Vec::new();

        if self.daily_pnl <= -self.config.max_daily_loss {
            reasons.push(RejectReason::DailyLossLimit {
                daily_pnl: self.daily_pnl,
                limit: self.config.max_daily_loss,
            });
        }

        let open = self.positions.len() + self.pending.len();
        if open >= self.config.max_concurrent_positions {
            reasons.push(RejectReason::MaxConcurrentPositions {
                open,
                max: self.config.max_concurrent_positions,
            });
        }

        if let Some(last_loss) = self.last_loss_at {
            let cooldown = Duration::seconds(self.config.loss_cooldown_secs);
            let elapsed = now.signed_duration_since(last_loss);
            if elapsed < cooldown {
                reasons.push(RejectReason::LossCooldown {
                    remaining_secs: (cooldown - elapsed).num_seconds(),
                });
            }
        }

        reasons
    }

    /// Applies the gateway's answer to a pending approval. A decline rolls
    /// the reservation back and is reported as an execution error.
    pub fn handle_execution_result(
        &mut self,
        trade_id: &str,
        response: &ExecutionResponse,
        now: DateTime<Utc>,
    ) -> BotResult<Position> {
        let trade = self
            .pending
            .remove(trade_id)
            .ok_or_else(|| BotError::UnknownPosition { id: trade_id.to_string() })?;
        let request = &trade.request;

        if !response.accepted {
            let reason = response
                .reason
                .clone()
                .unwrap_or_else(|| "declined by gateway".to_string());
            self.exposure.release(&request.asset, request.size);
            self.metrics.execution_failures += 1;
            self.update_portfolio();
            self.update_risk_metrics();

            let alert = Alert {
                alert_type: AlertType::Warning,
                category: AlertCategory::ExecutionFailure,
                message: format!("Execution of {} {} failed: {}", request.size, request.asset, reason),
                level: Decimal::ZERO,
                value: Decimal::from(self.metrics.execution_failures),
                threshold: Decimal::ZERO,
                timestamp: now,
            };
            self.raise(alert);

            warn!(trade_id = %trade_id, asset = %request.asset, reason = %reason, "Execution failed, exposure released");
            return Err(BotError::execution(&request.asset, reason));
        }

        let entry = request.buy_price;
        let position = Position {
            id: trade.id.clone(),
            venue_position_id: response.position_id.clone(),
            asset: request.asset.clone(),
            side: trade.side,
            size: request.size,
            entry_price: entry,
            current_price: entry,
            stop_loss: request.stop_loss,
            take_profit: request.take_profit,
            trailing_stop: self.initial_trailing_stop(trade.side, entry),
            status: PositionStatus::Open,
            pnl: Decimal::ZERO,
            exit_reason: None,
            opened_at: now,
            closed_at: None,
        };

        self.positions.insert(position.id.clone(), position.clone());
        self.update_portfolio();
        self.update_risk_metrics();
        self.check_alerts(now);

        info!(
            position_id = %position.id,
            venue_position_id = ?position.venue_position_id,
            asset = %position.asset,
            size = %position.size,
            entry = %entry,
            "Position opened"
        );
        Ok(position)
    }

    /// Marks every open position in `asset` and fires stops and targets.
    /// Returns the positions this price closed.
    pub fn update_price(&mut self, asset: &Asset, price: Decimal, now: DateTime<Utc>) -> Vec<Position> {
        if price <= Decimal::ZERO {
            return Vec::new();
        }

        let trailing = self.config.trailing_stop;
        let mut exits = Vec::new();

        for position in self.positions.values_mut().filter(|p| &p.asset == asset) {
            position.current_price = price;
            position.pnl = position.pnl_at(price);

            let exit = match position.side {
                PositionSide::Long => {
                    let candidate = price * (Decimal::ONE - trailing);
                    if candidate > position.trailing_stop {
                        position.trailing_stop = candidate;
                    }
                    if price <= position.stop_loss {
                        Some(ExitReason::StopLoss)
                    } else if price <= position.trailing_stop {
                        Some(ExitReason::TrailingStop)
                    } else if price >= position.take_profit {
                        Some(ExitReason::TakeProfit)
                    } else {
                        None
                    }
                }
                PositionSide::Short => {
                    let candidate = price * (Decimal::ONE + trailing);
                    if candidate < position.trailing_stop {
                        position.trailing_stop = candidate;
                    }
                    if price >= position.stop_loss {
                        Some(ExitReason::StopLoss)
                    } else if price >= position.trailing_stop {
                        Some(ExitReason::TrailingStop)
                    } else if price <= position.take_profit {
                        Some(ExitReason::TakeProfit)
                    } else {
                        None
                    }
                }
            };

            if let Some(reason) = exit {
                exits.push((position.id.clone(), reason));
            }
        }

        let closed: Vec<Position> = exits
            .into_iter()
            .filter_map(|(id, reason)| self.finalize(&id, reason, now))
            .collect();

        self.update_portfolio();
        self.update_risk_metrics();
        self.check_alerts(now);
        closed
    }

    pub fn close_position(&mut self, position_id: &str, price: Decimal, now: DateTime<Utc>) -> BotResult<Position> {
        let position = self
            .positions
            .get_mut(position_id)
            .ok_or_else(|| BotError::UnknownPosition { id: position_id.to_string() })?;
        position.current_price = price;
        position.pnl = position.pnl_at(price);

        let closed = self
            .finalize(position_id, ExitReason::Manual, now)
            .ok_or_else(|| BotError::UnknownPosition { id: position_id.to_string() })?;

        self.update_portfolio();
        self.update_risk_metrics();
        self.check_alerts(now);
        Ok(closed)
    }

    fn finalize(&mut self, position_id: &str, reason: ExitReason, now: DateTime<Utc>) -> Option<Position> {
        let mut position = self.positions.remove(position_id)?;
        position.status = match reason {
            ExitReason::StopLoss | ExitReason::TrailingStop => PositionStatus::Stopped,
            ExitReason::TakeProfit | ExitReason::Manual => PositionStatus::Closed,
        };
        position.exit_reason = Some(reason);
        position.closed_at = Some(now);

        self.portfolio.realized_pnl = self.portfolio.realized_pnl.saturating_add(position.pnl);
        self.daily_pnl = self.daily_pnl.saturating_add(position.pnl);
        if position.pnl < Decimal::ZERO {
            self.last_loss_at = Some(now);
        }
        self.exposure.release(&position.asset, position.size);

        if self.returns.len() == self.config.return_series_capacity {
            self.returns.pop_front();
        }
        self.returns.push_back(position.return_fraction());
        self.equity_curve
            .push(self.config.initial_capital.saturating_add(self.portfolio.realized_pnl));

        if self.closed.len() == self.config.return_series_capacity {
            self.closed.pop_front();
        }
        self.closed.push_back(position.clone());

        info!(
            position_id = %position.id,
            asset = %position.asset,
            reason = ?reason,
            pnl = %position.pnl.round_dp(4),
            daily_pnl = %self.daily_pnl.round_dp(4),
            "Position closed"
        );
        Some(position)
    }

    /// Re-derives portfolio aggregates from positions and the exposure book.
    pub fn update_portfolio(&mut self) {
        let unrealized = self
            .positions
            .values()
            .fold(Decimal::ZERO, |acc, p| acc.saturating_add(p.pnl));
        self.portfolio.unrealized_pnl = unrealized;
        self.portfolio.total_value = self
            .config
            .initial_capital
            .saturating_add(self.portfolio.realized_pnl)
            .saturating_add(unrealized);
        self.portfolio.total_exposure = self.exposure.total();
        self.portfolio.available_capital =
            (self.portfolio.total_value - self.portfolio.total_exposure).max(Decimal::ZERO);
    }

    /// Recomputes metrics from the return series, equity curve and closed
    /// trades. The curve is extended with the current mark-to-market value,
    /// so open losses show up in drawdown. A metric that cannot be computed
    /// keeps its previous value.
    pub fn update_risk_metrics(&mut self) {
        let returns: Vec<Decimal> = self.returns.iter().copied().collect();

        if let Some(var) = calculate_var(&returns, self.config.var_confidence) {
            self.metrics.var_95 = var;
        }
        if let Some(sharpe) = calculate_sharpe_ratio(&returns, self.config.risk_free_rate) {
            self.metrics.sharpe_ratio = sharpe;
        }

        let mut curve = self.equity_curve.clone();
        curve.push(self.portfolio.total_value);
        // marks between closes are not kept on the curve, so the worst seen
        // drawdown is carried over
        if let Some(max_dd) = calculate_max_drawdown(&curve) {
            self.metrics.max_drawdown = self.metrics.max_drawdown.max(max_dd);
        }
        if let Some(current_dd) = calculate_current_drawdown(&curve) {
            self.metrics.current_drawdown = current_dd;
        }

        let stats = TradeStats::from_closed(&self.closed);
        self.metrics.win_rate = stats.win_rate;
        self.metrics.avg_win = stats.avg_win;
        self.metrics.avg_loss = stats.avg_loss;
        self.metrics.profit_factor = stats.profit_factor;
    }

    fn check_alerts(&mut self, now: DateTime<Utc>) {
        let mut current = check_risk_alerts(
            self.portfolio.exposure_ratio(),
            self.metrics.current_drawdown,
            &self.thresholds,
            now,
        );
        if self.daily_pnl < Decimal::ZERO {
            current.extend(self.thresholds.evaluate(
                AlertCategory::DailyLoss,
                -self.daily_pnl,
                self.config.max_daily_loss,
                now,
            ));
        }

        for category in [AlertCategory::Exposure, AlertCategory::Drawdown, AlertCategory::DailyLoss] {
            match current.iter().find(|a| a.category == category) {
                Some(alert) => {
                    // only escalations and de-escalations, not every tick
                    if self.active_levels.get(&category) != Some(&alert.alert_type) {
                        self.active_levels.insert(category, alert.alert_type);
                        self.raise(alert.clone());
                    }
                }
                None => {
                    self.active_levels.remove(&category);
                }
            }
        }
    }

    fn raise(&mut self, alert: Alert) {
        match alert.alert_type {
            AlertType::Emergency => error!(category = ?alert.category, "🚨 {}", alert.message),
            AlertType::Warning => warn!(category = ?alert.category, "⚠️ {}", alert.message),
        }
        self.unpublished.push(alert.clone());
        self.alerts.push(alert);
    }

    /// Alerts raised since the last call, for persistence.
    pub fn take_new_alerts(&mut self) -> Vec<Alert> {
        std::mem::take(&mut self.unpublished)
    }

    pub fn risk_status(&self) -> RiskStatus {
        RiskStatus {
            portfolio: self.portfolio.clone(),
            metrics: self.metrics.clone(),
            exposure: ExposureSummary {
                total: self.portfolio.total_exposure,
                ratio: self.portfolio.exposure_ratio(),
                limit: self.config.max_portfolio_exposure,
            },
            open_positions: self.positions.values().cloned().collect(),
            alerts: self.alerts.recent(RECENT_ALERTS),
            config: self.config.clone(),
        }
    }

    /// First reason trading should pause, if any.
    pub fn should_stop_trading(&self, now: DateTime<Utc>) -> Option<RejectReason> {
        self.guard_reasons(now).into_iter().next()
    }

    /// Start-of-day reset: clears daily P&L and forgets closed trades older
    /// than a week.
    pub fn reset_daily_metrics(&mut self, now: DateTime<Utc>) {
        self.daily_pnl = Decimal::ZERO;
        let horizon = now - Duration::days(CLOSED_HISTORY_DAYS);
        self.closed
            .retain(|p| p.closed_at.map(|t| t > horizon).unwrap_or(false));
        self.active_levels.remove(&AlertCategory::DailyLoss);
        info!("Risk manager daily metrics reset");
    }

    pub fn daily_pnl(&self) -> Decimal {
        self.daily_pnl
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn metrics(&self) -> &RiskMetrics {
        &self.metrics
    }

    pub fn pending_trade(&self, trade_id: &str) -> Option<&ApprovedTrade> {
        self.pending.get(trade_id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn open_positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub fn closed_positions(&self) -> impl Iterator<Item = &Position> {
        self.closed.iter()
    }
}
