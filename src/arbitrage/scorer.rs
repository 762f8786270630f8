//! Opportunity confidence scoring

use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use crate::config::ScorerConfig;
use crate::types::Opportunity;

pub struct OpportunityScorer {
    config: ScorerConfig,
}

impl OpportunityScorer {
    pub fn new(config: ScorerConfig) -> Self {
        Self { config }
    }

    /// base + spread * weight, less a penalty once the opportunity is older
    /// than the staleness window. Always within [0, 100]; a product too
    /// large for a `Decimal` saturates.
    pub fn score(&self, opportunity: &Opportunity, now: DateTime<Utc>) -> Decimal {
        let mut score = opportunity
            .spread_percent
            .checked_mul(self.config.spread_weight)
            .and_then(|weighted| weighted.checked_add(self.config.base_score))
            .unwrap_or_else(|| {
                if opportunity.spread_percent.is_sign_negative() != self.config.spread_weight.is_sign_negative() {
                    Decimal::MIN
                } else {
                    Decimal::MAX
                }
            });
        if now.signed_duration_since(opportunity.observed_at) > self.config.staleness_after {
            score = score.saturating_sub(self.config.staleness_penalty);
        }
        score.max(Decimal::ZERO).min(dec!(100))
    }

    pub fn is_eligible(&self, score: Decimal) -> bool {
        score > self.config.execution_threshold
    }

    /// Scores every opportunity in place and sorts best first. Ties keep
    /// detection order.
    pub fn rank(&self, opportunities: &mut Vec<Opportunity>, now: DateTime<Utc>) {
        for opp in opportunities.iter_mut() {
            opp.confidence_score = self.score(opp, now);
        }
        opportunities.sort_by(|a, b| b.confidence_score.cmp(&a.confidence_score));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Asset, Venue};
    use chrono::Duration;
    use proptest::prelude::*;

    fn opportunity(spread: Decimal, observed_at: DateTime<Utc>) -> Opportunity {
        Opportunity {
            id: "o".into(),
            asset: Asset::native("XLM").unwrap(),
            buy_venue: Venue::new("a").unwrap(),
            sell_venue: Venue::new("b").unwrap(),
            buy_price: dec!(1),
            sell_price: dec!(1) + spread / dec!(100),
            spread_percent: spread,
            observed_at,
            confidence_score: Decimal::ZERO,
        }
    }

    #[test]
    fn test_fresh_opportunity_is_capped_at_100() {
        let scorer = OpportunityScorer::new(ScorerConfig::default());
        let now = Utc::now();
        let score = scorer.score(&opportunity(dec!(1.2), now), now);
        assert_eq!(score, dec!(100));
        assert!(scorer.is_eligible(score));
    }

    #[test]
    fn test_stale_penalty_applies_after_30s() {
        let scorer = OpportunityScorer::new(ScorerConfig::default());
        let now = Utc::now();
        let at_edge = opportunity(dec!(0.6), now - Duration::seconds(30));
        assert_eq!(scorer.score(&at_edge, now), dec!(100));

        let stale = opportunity(dec!(0.6), now - Duration::seconds(31));
        assert_eq!(scorer.score(&stale, now), dec!(86));

        // 100 + 0 - 20 = 80, which is not strictly above the threshold
        let flat = opportunity(dec!(0), now - Duration::seconds(45));
        assert_eq!(scorer.score(&flat, now), dec!(80));
        assert!(!scorer.is_eligible(dec!(80)));
    }

    #[test]
    fn test_rank_orders_by_score() {
        let scorer = OpportunityScorer::new(ScorerConfig {
            base_score: dec!(50),
            ..Default::default()
        });
        let now = Utc::now();
        let mut opps = vec![opportunity(dec!(1), now), opportunity(dec!(3), now), opportunity(dec!(2), now)];
        scorer.rank(&mut opps, now);
        let scores: Vec<Decimal> = opps.iter().map(|o| o.confidence_score).collect();
        assert_eq!(scores, vec![dec!(80), dec!(70), dec!(60)]);
    }

    #[test]
    fn test_huge_spread_saturates() {
        let scorer = OpportunityScorer::new(ScorerConfig::default());
        let now = Utc::now();
        let mut opp = opportunity(dec!(1), now);
        opp.spread_percent = Decimal::MAX;
        assert_eq!(scorer.score(&opp, now), dec!(100));
        opp.spread_percent = Decimal::MIN;
        assert_eq!(scorer.score(&opp, now), dec!(0));
    }

    proptest! {
        #[test]
        fn prop_score_always_clamped(spread in -100_000i64..1_000_000, age in 0i64..3600) {
            let scorer = OpportunityScorer::new(ScorerConfig::default());
            let now = Utc::now();
            let opp = opportunity(Decimal::new(spread, 3), now - Duration::seconds(age));
            let score = scorer.score(&opp, now);
            prop_assert!(score >= Decimal::ZERO && score <= dec!(100));
        }
    }
}
