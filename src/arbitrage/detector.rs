//! Cross-venue spread detection

use tracing::debug;
use crate::config::DetectorConfig;
use crate::types::{Asset, Opportunity, Quote};
use super::compare_pair;

pub struct SpreadDetector {
    config: DetectorConfig,
}

impl SpreadDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Every unordered venue pair of `quotes` whose spread clears the
    /// threshold. Quotes for other assets are ignored; input order decides
    /// output order, so callers pass venue-sorted quotes.
    pub fn detect(&self, asset: &Asset, quotes: &[Quote]) -> Vec<Opportunity> {
        let quotes: Vec<&Quote> = quotes.iter().filter(|q| &q.asset == asset).collect();
        if quotes.len() < 2 {
            return Vec::new();
        }

        let mut found = Vec::new();
        for (i, a) in quotes.iter().enumerate() {
            for b in &quotes[i + 1..] {
                if let Some(opp) = compare_pair(asset, a, b, self.config.min_spread_percent) {
                    found.push(opp);
                }
            }
        }

        if !found.is_empty() {
            debug!(asset = %asset, venues = quotes.len(), found = found.len(), "Spreads detected");
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Venue;
    use chrono::Utc;
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn quotes(prices: &[(&str, Decimal)]) -> Vec<Quote> {
        let asset = Asset::native("BTC").unwrap();
        let now = Utc::now();
        prices
            .iter()
            .map(|(venue, price)| Quote::new(asset.clone(), Venue::new(venue).unwrap(), *price, now))
            .collect()
    }

    #[test]
    fn test_fewer_than_two_venues() {
        let detector = SpreadDetector::new(DetectorConfig::default());
        let asset = Asset::native("BTC").unwrap();
        assert!(detector.detect(&asset, &[]).is_empty());
        assert!(detector.detect(&asset, &quotes(&[("binance", dec!(100))])).is_empty());
    }

    #[test]
    fn test_all_qualifying_pairs_in_order() {
        let detector = SpreadDetector::new(DetectorConfig::default());
        let asset = Asset::native("BTC").unwrap();
        let found = detector.detect(
            &asset,
            &quotes(&[("binance", dec!(100)), ("coinbase", dec!(100.2)), ("kraken", dec!(102))]),
        );
        // binance/coinbase is only 0.2%
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].buy_venue.as_str(), "binance");
        assert_eq!(found[0].sell_venue.as_str(), "kraken");
        assert_eq!(found[1].buy_venue.as_str(), "coinbase");
        assert_eq!(found[1].sell_venue.as_str(), "kraken");
    }

    #[test]
    fn test_two_percent_spread_between_two_venues() {
        let detector = SpreadDetector::new(DetectorConfig::default());
        let asset = Asset::native("BTC").unwrap();
        let found = detector.detect(&asset, &quotes(&[("venue1", dec!(0.10)), ("venue2", dec!(0.102))]));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].buy_venue.as_str(), "venue1");
        assert_eq!(found[0].sell_venue.as_str(), "venue2");
        assert_eq!(found[0].spread_percent, dec!(2));
    }

    proptest! {
        #[test]
        fn prop_buy_price_never_exceeds_sell_price(
            prices in proptest::collection::vec(1i64..10_000_000, 2..6)
        ) {
            let detector = SpreadDetector::new(DetectorConfig::default());
            let asset = Asset::native("BTC").unwrap();
            let named: Vec<(String, Decimal)> = prices
                .iter()
                .enumerate()
                .map(|(i, p)| (format!("venue{}", i), Decimal::new(*p, 2)))
                .collect();
            let refs: Vec<(&str, Decimal)> = named.iter().map(|(n, p)| (n.as_str(), *p)).collect();

            for opp in detector.detect(&asset, &quotes(&refs)) {
                prop_assert!(opp.buy_price <= opp.sell_price);
                prop_assert!(opp.spread_percent > dec!(0.5));
                prop_assert_ne!(opp.buy_venue, opp.sell_venue);
            }
        }
    }
}
