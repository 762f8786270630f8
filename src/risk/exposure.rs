//! Exposure accounting and limit checks

use rust_decimal::prelude::*;
use std::collections::HashMap;
use crate::config::RiskConfig;
use crate::types::{Asset, ExposureCheck, ExposureLimit};

/// Notional committed per asset, covering open positions and approvals
/// still awaiting the gateway.
#[derive(Debug, Clone, Default)]
pub struct ExposureBook {
    by_asset: HashMap<Asset, Decimal>,
}

impl ExposureBook {
    pub fn reserve(&mut self, asset: &Asset, amount: Decimal) {
        *self.by_asset.entry(asset.clone()).or_insert(Decimal::ZERO) += amount;
    }

    pub fn release(&mut self, asset: &Asset, amount: Decimal) {
        if let Some(current) = self.by_asset.get_mut(asset) {
            *current = (*current - amount).max(Decimal::ZERO);
            if current.is_zero() {
                self.by_asset.remove(asset);
            }
        }
    }

    pub fn asset(&self, asset: &Asset) -> Decimal {
        self.by_asset.get(asset).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn total(&self) -> Decimal {
        self.by_asset.values().sum()
    }
}

/// Checks a proposed trade against the portfolio and single-asset limits,
/// both measured against `total_value`. Every violated limit is reported.
pub fn check_exposure_limits(
    book: &ExposureBook,
    asset: &Asset,
    proposed: Decimal,
    total_value: Decimal,
    config: &RiskConfig,
) -> ExposureCheck {
    let mut failures = Vec::new();

    let total_limit = config.max_portfolio_exposure * total_value;
    let current_total = book.total();
    if current_total + proposed > total_limit {
        failures.push(ExposureLimit::TotalPortfolio {
            current: current_total,
            proposed,
            limit: total_limit,
        });
    }

    let asset_limit = config.max_single_asset_exposure * total_value;
    let current_asset = book.asset(asset);
    if current_asset + proposed > asset_limit {
        failures.push(ExposureLimit::SingleAsset {
            asset: asset.clone(),
            current: current_asset,
            proposed,
            limit: asset_limit,
        });
    }

    ExposureCheck {
        passed: failures.is_empty(),
        failures,
    }
}
