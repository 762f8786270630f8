//! Arbitrage opportunity storage

use anyhow::Result;
use std::path::Path;
use tracing::info;
use crate::types::Opportunity;
use super::append_jsonl;

pub fn save_opportunity(output_dir: &Path, opp: &Opportunity) -> Result<()> {
    append_jsonl(output_dir, "opportunities", "arbitrage", opp.observed_at, opp)?;

    info!(
        opportunity_id = %opp.id,
        asset = %opp.asset,
        spread_pct = %opp.spread_percent.round_dp(4),
        score = %opp.confidence_score,
        "Saved arbitrage opportunity"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Asset, Venue};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    #[test]
    fn test_appends_one_line_per_opportunity() {
        let dir = tempfile::tempdir().unwrap();
        let observed_at = Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap();
        let opp = Opportunity {
            id: "opp-1".into(),
            asset: Asset::native("XLM").unwrap(),
            buy_venue: Venue::new("kraken").unwrap(),
            sell_venue: Venue::new("binance").unwrap(),
            buy_price: dec!(0.100),
            sell_price: dec!(0.102),
            spread_percent: dec!(2),
            observed_at,
            confidence_score: dec!(100),
        };

        save_opportunity(dir.path(), &opp).unwrap();
        save_opportunity(dir.path(), &opp).unwrap();

        let file = dir.path().join("opportunities/arbitrage_2024-03-09.jsonl");
        let contents = std::fs::read_to_string(file).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: Opportunity = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed, opp);
    }
}
