//! Bot configuration settings and environment variable handling

use chrono::Duration;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::env;
use std::str::FromStr;
use tracing::warn;

use crate::errors::{BotError, BotResult};
use crate::types::{Asset, Venue};

// Price validation constants
pub const MIN_QUOTE_CONFIDENCE: u8 = 80;
pub const PRICE_STALENESS_SECONDS: i64 = 60;
pub const MAX_PRICE_DEVIATION_PCT: Decimal = dec!(5); // vs last accepted price
pub const PRICE_HISTORY_RETENTION_SECS: i64 = 300;

// Detection and scoring constants
pub const MIN_SPREAD_PCT: Decimal = dec!(0.5);
pub const BASE_OPPORTUNITY_SCORE: Decimal = dec!(100);
pub const SPREAD_SCORE_WEIGHT: Decimal = dec!(10);
pub const STALE_OPPORTUNITY_SECS: i64 = 30;
pub const STALE_OPPORTUNITY_PENALTY: Decimal = dec!(20);
pub const EXECUTION_SCORE_THRESHOLD: Decimal = dec!(80);
pub const OPPORTUNITY_RETENTION_SECS: i64 = 300;

// Runtime constants
pub const SWEEP_INTERVAL_SECS: u64 = 60;
pub const POLL_INTERVAL_SECS: u64 = 10;
pub const EXECUTION_TIMEOUT_SECS: u64 = 30;
pub const FETCH_TIMEOUT_SECS: u64 = 5;
pub const FETCH_MAX_ATTEMPTS: u32 = 3;

// Risk bookkeeping constants
pub const ALERT_BUFFER_CAPACITY: usize = 100;
pub const RECENT_ALERTS: usize = 10;
pub const RETURN_SERIES_CAPACITY: usize = 1000;
pub const TRADING_DAYS_PER_YEAR: u32 = 252;

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatorConfig {
    pub min_confidence: u8,
    pub freshness: Duration,
    pub max_deviation_percent: Decimal,
    pub history_retention: Duration,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            min_confidence: MIN_QUOTE_CONFIDENCE,
            freshness: Duration::seconds(PRICE_STALENESS_SECONDS),
            max_deviation_percent: MAX_PRICE_DEVIATION_PCT,
            history_retention: Duration::seconds(PRICE_HISTORY_RETENTION_SECS),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    pub min_spread_percent: Decimal,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self { min_spread_percent: MIN_SPREAD_PCT }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScorerConfig {
    pub base_score: Decimal,
    pub spread_weight: Decimal,
    pub staleness_after: Duration,
    pub staleness_penalty: Decimal,
    pub execution_threshold: Decimal,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            base_score: BASE_OPPORTUNITY_SCORE,
            spread_weight: SPREAD_SCORE_WEIGHT,
            staleness_after: Duration::seconds(STALE_OPPORTUNITY_SECS),
            staleness_penalty: STALE_OPPORTUNITY_PENALTY,
            execution_threshold: EXECUTION_SCORE_THRESHOLD,
        }
    }
}

/// Risk limits. Ratios are fractions of capital (0.1 = 10%).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskConfig {
    pub initial_capital: Decimal,
    pub max_position_size: Decimal,
    pub max_portfolio_exposure: Decimal,
    pub max_single_asset_exposure: Decimal,
    pub kelly_fraction: Decimal,
    pub fixed_fractional: Decimal,
    pub default_stop_loss: Decimal,
    pub default_take_profit: Decimal,
    pub trailing_stop: Decimal,
    pub var_confidence: Decimal,
    pub risk_free_rate: Decimal,
    pub max_drawdown: Decimal,
    pub alert_warning_ratio: Decimal,
    pub alert_emergency_ratio: Decimal,
    // Kelly inputs used until enough trades have closed
    pub prior_win_rate: Decimal,
    pub prior_avg_win: Decimal,
    pub prior_avg_loss: Decimal,
    pub min_trades_for_kelly: usize,
    pub max_daily_loss: Decimal,
    pub max_concurrent_positions: usize,
    pub loss_cooldown_secs: i64,
    pub alert_capacity: usize,
    pub return_series_capacity: usize,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            initial_capital: dec!(10000),
            max_position_size: dec!(0.1),
            max_portfolio_exposure: dec!(0.8),
            max_single_asset_exposure: dec!(0.3),
            kelly_fraction: dec!(0.25),
            fixed_fractional: dec!(0.02),
            default_stop_loss: dec!(0.05),
            default_take_profit: dec!(0.10),
            trailing_stop: dec!(0.03),
            var_confidence: dec!(0.95),
            risk_free_rate: dec!(0.02),
            max_drawdown: dec!(0.20),
            alert_warning_ratio: dec!(0.8),
            alert_emergency_ratio: dec!(0.95),
            prior_win_rate: dec!(0.6),
            prior_avg_win: dec!(100),
            prior_avg_loss: dec!(-50),
            min_trades_for_kelly: 10,
            max_daily_loss: dec!(500),
            max_concurrent_positions: 3,
            loss_cooldown_secs: 300,
            alert_capacity: ALERT_BUFFER_CAPACITY,
            return_series_capacity: RETURN_SERIES_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    pub price_api_url: Option<String>,
    pub price_api_key: Option<String>,
    pub tracked_assets: Vec<Asset>,
    pub venues: Vec<Venue>,
    pub fetch_max_attempts: u32,
    pub fetch_timeout_secs: u64,
    pub retry_initial_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    /// (variable, entry) pairs from the asset and venue lists that did not parse.
    pub rejected_entries: Vec<(String, String)>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            price_api_url: None,
            price_api_key: None,
            tracked_assets: Vec::new(),
            venues: Vec::new(),
            fetch_max_attempts: FETCH_MAX_ATTEMPTS,
            fetch_timeout_secs: FETCH_TIMEOUT_SECS,
            retry_initial_delay_ms: 200,
            retry_max_delay_ms: 5000,
            rejected_entries: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    pub sweep_interval_secs: u64,
    pub poll_interval_secs: u64,
    pub opportunity_retention: Duration,
    pub output_dir: String,
    pub execution_timeout_secs: u64,
    pub max_consecutive_errors: u32,
    pub circuit_breaker_cooldown_secs: u64,
    pub simulated_fill_rate: f64,
    pub simulated_latency_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: SWEEP_INTERVAL_SECS,
            poll_interval_secs: POLL_INTERVAL_SECS,
            opportunity_retention: Duration::seconds(OPPORTUNITY_RETENTION_SECS),
            output_dir: "data".to_string(),
            execution_timeout_secs: EXECUTION_TIMEOUT_SECS,
            max_consecutive_errors: 5,
            circuit_breaker_cooldown_secs: 300, // 5 minutes
            simulated_fill_rate: 0.9,
            simulated_latency_ms: 150,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub validator: ValidatorConfig,
    pub detector: DetectorConfig,
    pub scorer: ScorerConfig,
    pub risk: RiskConfig,
    pub feed: FeedConfig,
    pub runtime: RuntimeConfig,
}

impl Config {
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; values that fail to parse
    /// fall back to defaults and are clamped into sane ranges.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let decimal = |key: &str, default: Decimal| {
            lookup(key)
                .and_then(|s| Decimal::from_str(s.trim()).ok())
                .unwrap_or(default)
        };
        let number = |key: &str, default: u64| {
            lookup(key)
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(default)
        };

        let defaults = Config::default();

        let validator = ValidatorConfig {
            min_confidence: number("MIN_QUOTE_CONFIDENCE", MIN_QUOTE_CONFIDENCE as u64).min(100) as u8,
            freshness: Duration::seconds(
                number("PRICE_STALENESS_SECONDS", PRICE_STALENESS_SECONDS as u64).clamp(1, 3600) as i64,
            ),
            max_deviation_percent: decimal("MAX_PRICE_DEVIATION_PCT", MAX_PRICE_DEVIATION_PCT)
                .max(dec!(0.1))
                .min(dec!(100)),
            ..defaults.validator
        };

        let detector = DetectorConfig {
            min_spread_percent: decimal("MIN_SPREAD_PCT", MIN_SPREAD_PCT).max(Decimal::ZERO),
        };

        let scorer = ScorerConfig {
            execution_threshold: decimal("EXECUTION_SCORE_THRESHOLD", EXECUTION_SCORE_THRESHOLD)
                .max(Decimal::ZERO)
                .min(dec!(100)),
            ..defaults.scorer
        };

        let risk_defaults = defaults.risk;
        let risk = RiskConfig {
            initial_capital: decimal("INITIAL_CAPITAL", risk_defaults.initial_capital),
            max_position_size: decimal("MAX_POSITION_SIZE", risk_defaults.max_position_size),
            max_portfolio_exposure: decimal("MAX_PORTFOLIO_EXPOSURE", risk_defaults.max_portfolio_exposure),
            max_single_asset_exposure: decimal(
                "MAX_SINGLE_ASSET_EXPOSURE",
                risk_defaults.max_single_asset_exposure,
            ),
            kelly_fraction: decimal("KELLY_FRACTION", risk_defaults.kelly_fraction),
            fixed_fractional: decimal("FIXED_FRACTIONAL", risk_defaults.fixed_fractional),
            default_stop_loss: decimal("DEFAULT_STOP_LOSS", risk_defaults.default_stop_loss),
            default_take_profit: decimal("DEFAULT_TAKE_PROFIT", risk_defaults.default_take_profit),
            trailing_stop: decimal("TRAILING_STOP", risk_defaults.trailing_stop),
            max_drawdown: decimal("MAX_DRAWDOWN", risk_defaults.max_drawdown),
            max_daily_loss: decimal("MAX_DAILY_LOSS", risk_defaults.max_daily_loss),
            max_concurrent_positions: number(
                "MAX_CONCURRENT_POSITIONS",
                risk_defaults.max_concurrent_positions as u64,
            )
            .clamp(1, 100) as usize,
            ..risk_defaults
        };

        let mut rejected_entries = Vec::new();
        let (tracked_assets, bad_assets) = parse_list::<Asset>(&lookup("TRACKED_ASSETS").unwrap_or_default());
        rejected_entries.extend(bad_assets.into_iter().map(|e| ("TRACKED_ASSETS".to_string(), e)));
        let (venues, bad_venues) = parse_list::<Venue>(&lookup("VENUES").unwrap_or_default());
        rejected_entries.extend(bad_venues.into_iter().map(|e| ("VENUES".to_string(), e)));

        let feed = FeedConfig {
            price_api_url: lookup("PRICE_API_URL").filter(|s| !s.trim().is_empty()),
            price_api_key: lookup("PRICE_API_KEY").filter(|s| !s.trim().is_empty()),
            tracked_assets,
            venues,
            rejected_entries,
            fetch_max_attempts: number("FETCH_MAX_ATTEMPTS", FETCH_MAX_ATTEMPTS as u64).clamp(1, 10) as u32,
            fetch_timeout_secs: number("FETCH_TIMEOUT_SECS", FETCH_TIMEOUT_SECS).clamp(1, 60),
            ..defaults.feed
        };

        let runtime = RuntimeConfig {
            sweep_interval_secs: number("SWEEP_INTERVAL_SECS", SWEEP_INTERVAL_SECS).max(1),
            poll_interval_secs: number("POLL_INTERVAL_SECS", POLL_INTERVAL_SECS).max(1),
            output_dir: lookup("OUTPUT_DIR").unwrap_or_else(|| "data".to_string()),
            execution_timeout_secs: number("EXECUTION_TIMEOUT_SECS", EXECUTION_TIMEOUT_SECS).clamp(1, 300),
            simulated_fill_rate: lookup("SIMULATED_FILL_RATE")
                .and_then(|s| s.trim().parse::<f64>().ok())
                .unwrap_or(0.9)
                .clamp(0.0, 1.0),
            ..defaults.runtime
        };

        Self {
            validator,
            detector,
            scorer,
            risk,
            feed,
            runtime,
        }
    }

    /// Startup checks; any failure here is fatal.
    pub fn validate(&self) -> BotResult<()> {
        if self.feed.price_api_url.is_none() {
            return Err(BotError::configuration("PRICE_API_URL", "price API URL is required"));
        }
        if self.feed.price_api_key.is_none() {
            return Err(BotError::configuration("PRICE_API_KEY", "price API key is required"));
        }
        if let Some((field, entry)) = self.feed.rejected_entries.first() {
            return Err(BotError::configuration(field, format!("invalid entry '{}'", entry)));
        }
        if self.feed.tracked_assets.is_empty() {
            return Err(BotError::configuration("TRACKED_ASSETS", "at least one asset must be tracked"));
        }
        if self.feed.venues.len() < 2 {
            return Err(BotError::configuration("VENUES", "at least two venues are needed to find spreads"));
        }

        let risk = &self.risk;
        if risk.initial_capital <= Decimal::ZERO {
            return Err(BotError::configuration("INITIAL_CAPITAL", "must be positive"));
        }
        let ratios = [
            ("MAX_POSITION_SIZE", risk.max_position_size),
            ("MAX_PORTFOLIO_EXPOSURE", risk.max_portfolio_exposure),
            ("MAX_SINGLE_ASSET_EXPOSURE", risk.max_single_asset_exposure),
            ("KELLY_FRACTION", risk.kelly_fraction),
            ("FIXED_FRACTIONAL", risk.fixed_fractional),
            ("DEFAULT_STOP_LOSS", risk.default_stop_loss),
            ("TRAILING_STOP", risk.trailing_stop),
            ("MAX_DRAWDOWN", risk.max_drawdown),
        ];
        for (field, value) in ratios {
            if value <= Decimal::ZERO || value > Decimal::ONE {
                return Err(BotError::configuration(field, format!("{} must be in (0, 1]", value)));
            }
        }
        if risk.default_take_profit <= Decimal::ZERO {
            return Err(BotError::configuration("DEFAULT_TAKE_PROFIT", "must be positive"));
        }
        if risk.max_daily_loss <= Decimal::ZERO {
            return Err(BotError::configuration("MAX_DAILY_LOSS", "must be positive"));
        }
        Ok(())
    }
}

/// Comma separated identifiers. Entries that fail to parse come back in
/// the second list so `validate` can refuse them.
fn parse_list<T: FromStr>(raw: &str) -> (Vec<T>, Vec<String>) {
    let mut parsed = Vec::new();
    let mut rejected = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match entry.parse() {
            Ok(value) => parsed.push(value),
            Err(_) => {
                warn!(entry = %entry, "Ignoring malformed list entry");
                rejected.push(entry.to_string());
            }
        }
    }
    (parsed, rejected)
}
