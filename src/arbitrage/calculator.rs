//! Arbitrage opportunity calculation

use rust_decimal::prelude::*;
use tracing::debug;
use crate::types::{Asset, Opportunity, Quote};
use crate::utils::math::percent_spread;

/// Compares two venue quotes for the same asset. Emits an unscored
/// opportunity when the spread over the lower price exceeds the threshold.
pub fn compare_pair(
    asset: &Asset,
    a: &Quote,
    b: &Quote,
    min_spread_percent: Decimal,
) -> Option<Opportunity> {
    if a.venue == b.venue {
        return None;
    }

    let Some(spread_percent) = percent_spread(a.price, b.price) else {
        debug!(asset = %asset, a = %a.price, b = %b.price, "Spread out of range, skipping pair");
        return None;
    };
    if spread_percent <= min_spread_percent {
        return None;
    }

    let (buy, sell) = if a.price <= b.price { (a, b) } else { (b, a) };

    Some(Opportunity {
        id: uuid::Uuid::new_v4().to_string(),
        asset: asset.clone(),
        buy_venue: buy.venue.clone(),
        sell_venue: sell.venue.clone(),
        buy_price: buy.price,
        sell_price: sell.price,
        spread_percent,
        observed_at: a.observed_at.max(b.observed_at),
        confidence_score: Decimal::ZERO,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Venue;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    #[test]
    fn test_buy_low_sell_high() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let asset = Asset::native("XLM").unwrap();
        let a = Quote::new(asset.clone(), Venue::new("binance").unwrap(), dec!(102), t);
        let b = Quote::new(asset.clone(), Venue::new("kraken").unwrap(), dec!(100), t + Duration::seconds(5));

        let opp = compare_pair(&asset, &a, &b, dec!(0.5)).unwrap();
        assert_eq!(opp.buy_venue.as_str(), "kraken");
        assert_eq!(opp.sell_venue.as_str(), "binance");
        assert_eq!(opp.spread_percent, dec!(2));
        assert_eq!(opp.observed_at, t + Duration::seconds(5));
    }

    #[test]
    fn test_threshold_is_strict() {
        let t = Utc::now();
        let asset = Asset::native("XLM").unwrap();
        let a = Quote::new(asset.clone(), Venue::new("binance").unwrap(), dec!(100.5), t);
        let b = Quote::new(asset.clone(), Venue::new("kraken").unwrap(), dec!(100), t);
        assert!(compare_pair(&asset, &a, &b, dec!(0.5)).is_none());
    }

    #[test]
    fn test_unrepresentable_spread_yields_nothing() {
        let t = Utc::now();
        let asset = Asset::native("XLM").unwrap();
        let a = Quote::new(asset.clone(), Venue::new("v1").unwrap(), Decimal::new(1, 28), t);
        let b = Quote::new(asset.clone(), Venue::new("v2").unwrap(), dec!(100000), t);
        assert!(compare_pair(&asset, &a, &b, dec!(0.5)).is_none());
    }
}
