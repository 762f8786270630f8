//! Quote-to-trade pipeline
//!
//! Owns every stateful component and applies one event at a time:
//! validated quotes update the price table, mark open positions and are
//! checked for spreads; eligible opportunities go through the risk manager.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::*;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};
use crate::{
    arbitrage::{OpportunityScorer, OpportunityStore, SpreadDetector},
    config::Config,
    errors::CircuitBreaker,
    risk::{RiskManager, TradeDecision},
    storage,
    types::{
        ApprovedTrade, Asset, ExecutionOutcome, ExecutionResponse, ExecutionStatus, Opportunity,
        Position, Quote, RiskStatus,
    },
    utils::display::print_opportunity,
    validation::PriceValidator,
};

#[derive(Debug, Clone)]
pub struct PipelineStats {
    pub started_at: Instant,
    pub quotes_received: u64,
    pub quotes_accepted: u64,
    pub quotes_rejected: u64,
    pub opportunities: u64,
    pub eligible_opportunities: u64,
    pub trades_approved: u64,
    pub trades_rejected: u64,
    pub executions_filled: u64,
    pub executions_failed: u64,
    pub positions_closed: u64,
    pub best_spread_percent: Decimal,
}

impl Default for PipelineStats {
    fn default() -> Self {
        Self {
            started_at: Instant::now(),
            quotes_received: 0,
            quotes_accepted: 0,
            quotes_rejected: 0,
            opportunities: 0,
            eligible_opportunities: 0,
            trades_approved: 0,
            trades_rejected: 0,
            executions_filled: 0,
            executions_failed: 0,
            positions_closed: 0,
            best_spread_percent: Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub history_pruned: usize,
    pub opportunities_pruned: usize,
    pub daily_reset: bool,
}

pub struct Pipeline {
    validator: PriceValidator,
    detector: SpreadDetector,
    scorer: OpportunityScorer,
    store: OpportunityStore,
    risk: RiskManager,
    breaker: CircuitBreaker,
    correlation: HashMap<Asset, Decimal>,
    output_dir: Option<PathBuf>,
    trading_day: Option<NaiveDate>,
    stats: PipelineStats,
}

impl Pipeline {
    pub fn new(config: &Config) -> Self {
        Self {
            validator: PriceValidator::new(config.validator.clone()),
            detector: SpreadDetector::new(config.detector.clone()),
            scorer: OpportunityScorer::new(config.scorer.clone()),
            store: OpportunityStore::new(config.runtime.opportunity_retention),
            risk: RiskManager::new(config.risk.clone()),
            breaker: CircuitBreaker::new(
                config.runtime.max_consecutive_errors,
                config.runtime.circuit_breaker_cooldown_secs,
            ),
            correlation: HashMap::new(),
            output_dir: None,
            trading_day: None,
            stats: PipelineStats::default(),
        }
    }

    /// Enables JSONL persistence of opportunities, executions and alerts.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Correlation factor applied when sizing trades in `asset`.
    pub fn set_correlation(&mut self, asset: Asset, factor: Decimal) {
        self.correlation.insert(asset, factor);
    }

    /// Runs one quote through validation, detection, scoring and risk.
    /// Returns the trades approved for execution.
    pub fn handle_quote(&mut self, quote: Quote, now: DateTime<Utc>) -> Vec<ApprovedTrade> {
        self.stats.quotes_received += 1;
        let asset = quote.asset.clone();
        let venue = quote.venue.clone();

        if !self.validator.validate(&asset, &venue, Some(&quote), now).is_accepted() {
            self.stats.quotes_rejected += 1;
            return Vec::new();
        }
        self.stats.quotes_accepted += 1;

        let closed = self.risk.update_price(&asset, quote.price, now);
        self.stats.positions_closed += closed.len() as u64;

        let live = self.validator.live_quotes(&asset, now);
        let mut opportunities = self.detector.detect(&asset, &live);
        self.scorer.rank(&mut opportunities, now);

        let mut approved = Vec::new();
        for opportunity in opportunities {
            self.stats.opportunities += 1;
            self.stats.best_spread_percent = self.stats.best_spread_percent.max(opportunity.spread_percent);
            self.persist_opportunity(&opportunity);

            if self.scorer.is_eligible(opportunity.confidence_score) {
                self.stats.eligible_opportunities += 1;
                print_opportunity(&opportunity);
                if let Some(trade) = self.evaluate(&opportunity, now) {
                    approved.push(trade);
                }
            }
            self.store.record(opportunity);
        }

        self.flush_alerts();
        approved
    }

    fn evaluate(&mut self, opportunity: &Opportunity, now: DateTime<Utc>) -> Option<ApprovedTrade> {
        if let Err(e) = self.breaker.check() {
            debug!(opportunity_id = %opportunity.id, error = %e, "Skipping risk evaluation");
            return None;
        }

        let correlation = self
            .correlation
            .get(&opportunity.asset)
            .copied()
            .unwrap_or(Decimal::ONE);

        match self.risk.evaluate_trade_opportunity(opportunity, correlation, now) {
            TradeDecision::Approved(trade) => {
                self.stats.trades_approved += 1;
                Some(trade)
            }
            TradeDecision::Rejected(rejection) => {
                self.stats.trades_rejected += 1;
                let reasons: Vec<String> = rejection.reasons.iter().map(ToString::to_string).collect();
                info!(opportunity_id = %rejection.opportunity_id, reasons = ?reasons, "Opportunity not traded");
                None
            }
        }
    }

    /// Applies a gateway answer. Returns the opened position on a fill.
    pub fn handle_execution_result(
        &mut self,
        trade_id: &str,
        response: &ExecutionResponse,
        elapsed_ms: u64,
        now: DateTime<Utc>,
    ) -> Option<Position> {
        let Some(trade) = self.risk.pending_trade(trade_id).cloned() else {
            warn!(trade_id = %trade_id, "Execution result for unknown trade");
            return None;
        };

        if response.accepted {
            self.breaker.record_success();
            self.stats.executions_filled += 1;
        } else {
            self.stats.executions_failed += 1;
            if self.breaker.record_error() {
                warn!("⚡ Execution circuit breaker tripped, pausing new trades");
            }
        }

        let result = self.risk.handle_execution_result(trade_id, response, now);

        let outcome = ExecutionOutcome {
            trade_id: trade.id.clone(),
            opportunity_id: trade.opportunity_id.clone(),
            asset: trade.request.asset.clone(),
            timestamp: now,
            status: if response.accepted { ExecutionStatus::Filled } else { ExecutionStatus::Declined },
            position_id: result.as_ref().ok().and_then(|p| p.venue_position_id.clone()),
            size: trade.request.size,
            execution_time_ms: elapsed_ms,
            error_message: result.as_ref().err().map(ToString::to_string),
        };
        if let Some(dir) = &self.output_dir {
            if let Err(e) = storage::save_execution_outcome(dir, &outcome) {
                warn!(error = %e, "Failed to persist execution outcome");
            }
        }

        self.flush_alerts();
        result.ok()
    }

    /// Periodic maintenance: expires price history and opportunities, and
    /// resets daily risk counters when the UTC date rolls over.
    pub fn sweep(&mut self, now: DateTime<Utc>) -> SweepReport {
        let history_pruned = self.validator.prune_history(now);
        let opportunities_pruned = self.store.prune(now);

        let today = now.date_naive();
        let daily_reset = match self.trading_day {
            Some(day) if day != today => {
                self.risk.reset_daily_metrics(now);
                true
            }
            _ => false,
        };
        self.trading_day = Some(today);

        debug!(
            history_pruned,
            opportunities_pruned,
            retained = self.store.len(),
            "Sweep complete"
        );
        SweepReport {
            history_pruned,
            opportunities_pruned,
            daily_reset,
        }
    }

    fn persist_opportunity(&self, opportunity: &Opportunity) {
        if let Some(dir) = &self.output_dir {
            if let Err(e) = storage::save_opportunity(dir, opportunity) {
                warn!(error = %e, "Failed to persist opportunity");
            }
        }
    }

    fn flush_alerts(&mut self) {
        let alerts = self.risk.take_new_alerts();
        let Some(dir) = &self.output_dir else {
            return;
        };
        for alert in &alerts {
            if let Err(e) = storage::save_alert(dir, alert) {
                warn!(error = %e, "Failed to persist alert");
            }
        }
    }

    pub fn risk_status(&self) -> RiskStatus {
        self.risk.risk_status()
    }

    pub fn risk(&self) -> &RiskManager {
        &self.risk
    }

    pub fn store(&self) -> &OpportunityStore {
        &self.store
    }

    pub fn validator(&self) -> &PriceValidator {
        &self.validator
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeConfig;
    use crate::types::{PositionStatus, Venue};
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn xlm() -> Asset {
        Asset::native("XLM").unwrap()
    }

    fn quote(venue: &str, price: Decimal, at: DateTime<Utc>) -> Quote {
        Quote::new(xlm(), Venue::new(venue).unwrap(), price, at)
    }

    fn pipeline() -> Pipeline {
        Pipeline::new(&Config::default())
    }

    #[test]
    fn test_spread_across_venues_produces_trade() {
        let mut p = pipeline();
        assert!(p.handle_quote(quote("binance", dec!(101), t0()), t0()).is_empty());
        let trades = p.handle_quote(quote("kraken", dec!(100), t0()), t0());

        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].request.buy_venue.as_str(), "kraken");
        assert_eq!(trades[0].request.sell_venue.as_str(), "binance");
        assert_eq!(p.store().len(), 1);
        assert_eq!(p.stats().opportunities, 1);
        assert_eq!(p.stats().trades_approved, 1);
    }

    #[test]
    fn test_rejected_quote_stops_early() {
        let mut p = pipeline();
        p.handle_quote(quote("binance", dec!(101), t0()), t0());
        let low_confidence = quote("kraken", dec!(100), t0()).with_confidence(50);
        assert!(p.handle_quote(low_confidence, t0()).is_empty());
        assert_eq!(p.stats().quotes_rejected, 1);
        assert!(p.store().is_empty());
    }

    #[test]
    fn test_small_spread_is_ignored() {
        let mut p = pipeline();
        p.handle_quote(quote("binance", dec!(100.4), t0()), t0());
        p.handle_quote(quote("kraken", dec!(100), t0()), t0());
        assert_eq!(p.stats().opportunities, 0);
    }

    #[test]
    fn test_fill_opens_position_and_price_closes_it() {
        let mut p = pipeline();
        p.handle_quote(quote("binance", dec!(101), t0()), t0());
        let trade = p.handle_quote(quote("kraken", dec!(100), t0()), t0()).remove(0);

        let position = p
            .handle_execution_result(&trade.id, &ExecutionResponse::filled("pos-1"), 12, t0())
            .unwrap();
        assert_eq!(position.id, trade.id);
        assert_eq!(position.venue_position_id.as_deref(), Some("pos-1"));
        assert_eq!(p.risk_status().open_positions.len(), 1);

        // climb to the 10% target in steps under the deviation cap
        let mut at = t0();
        for price in [dec!(104), dec!(108), dec!(110)] {
            at += Duration::seconds(1);
            p.handle_quote(quote("kraken", price, at), at);
        }
        assert_eq!(p.stats().positions_closed, 1);
        let closed: Vec<_> = p.risk().closed_positions().collect();
        assert_eq!(closed[0].status, PositionStatus::Closed);
        assert!(p.risk_status().portfolio.realized_pnl > dec!(0));
    }

    #[test]
    fn test_breaker_pauses_evaluation_after_failures() {
        let config = Config {
            runtime: RuntimeConfig {
                max_consecutive_errors: 1,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut p = Pipeline::new(&config);
        p.handle_quote(quote("binance", dec!(101), t0()), t0());
        let trade = p.handle_quote(quote("kraken", dec!(100), t0()), t0()).remove(0);
        assert!(p
            .handle_execution_result(&trade.id, &ExecutionResponse::declined("no liquidity"), 5, t0())
            .is_none());
        assert!(p.breaker().is_open());
        assert_eq!(p.risk_status().portfolio.total_exposure, dec!(0));

        let at = t0() + Duration::seconds(1);
        assert!(p.handle_quote(quote("kraken", dec!(100.1), at), at).is_empty());
        assert_eq!(p.stats().eligible_opportunities, 2);
        assert_eq!(p.stats().trades_approved, 1);
    }

    #[test]
    fn test_unknown_execution_result_is_ignored() {
        let mut p = pipeline();
        assert!(p
            .handle_execution_result("nope", &ExecutionResponse::filled("x"), 1, t0())
            .is_none());
        assert_eq!(p.stats().executions_filled, 0);
    }

    #[test]
    fn test_sweep_expires_old_state() {
        let mut p = pipeline();
        p.handle_quote(quote("binance", dec!(101), t0()), t0());
        p.handle_quote(quote("kraken", dec!(100), t0()), t0());
        assert_eq!(p.store().len(), 1);

        let report = p.sweep(t0() + Duration::seconds(301));
        assert_eq!(report.opportunities_pruned, 1);
        assert_eq!(report.history_pruned, 2);
        assert!(!report.daily_reset);
        assert!(p.validator().live_quotes(&xlm(), t0()).is_empty());

        let next_day = p.sweep(t0() + Duration::days(1));
        assert!(next_day.daily_reset);
    }

    #[test]
    fn test_events_persisted_when_output_dir_set() {
        let dir = tempfile::tempdir().unwrap();
        let mut p = pipeline().with_output_dir(dir.path());
        p.handle_quote(quote("binance", dec!(101), t0()), t0());
        let trade = p.handle_quote(quote("kraken", dec!(100), t0()), t0()).remove(0);
        p.handle_execution_result(&trade.id, &ExecutionResponse::declined("rejected"), 3, t0());

        let opps = std::fs::read_to_string(dir.path().join("opportunities/arbitrage_2024-06-01.jsonl")).unwrap();
        assert_eq!(opps.lines().count(), 1);
        let execs = std::fs::read_to_string(dir.path().join("executions/trades_2024-06-01.jsonl")).unwrap();
        assert!(execs.contains("Declined"));
        let alerts = std::fs::read_to_string(dir.path().join("alerts/risk_2024-06-01.jsonl")).unwrap();
        assert!(alerts.contains("ExecutionFailure"));
    }
}
