//! Price validation functions

use chrono::{DateTime, Duration, Utc};
use rust_decimal::prelude::*;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};
use crate::{
    config::ValidatorConfig,
    types::{Asset, PriceHistoryEntry, Quote, QuoteKey, RejectionReason, Validation, Venue},
    utils::math::percent_change,
};

/// Latest accepted quote per (asset, venue). Venues are kept sorted so that
/// downstream pair iteration is deterministic.
#[derive(Debug, Default)]
pub struct PriceTable {
    quotes: HashMap<Asset, BTreeMap<Venue, Quote>>,
}

impl PriceTable {
    pub fn upsert(&mut self, quote: Quote) {
        self.quotes
            .entry(quote.asset.clone())
            .or_default()
            .insert(quote.venue.clone(), quote);
    }

    pub fn get(&self, asset: &Asset, venue: &Venue) -> Option<&Quote> {
        self.quotes.get(asset).and_then(|venues| venues.get(venue))
    }

    /// Quotes for `asset` no older than `freshness`, ordered by venue.
    pub fn live_quotes(&self, asset: &Asset, now: DateTime<Utc>, freshness: Duration) -> Vec<Quote> {
        self.quotes
            .get(asset)
            .map(|venues| {
                venues
                    .values()
                    .filter(|q| q.age(now) <= freshness)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn prune(&mut self, now: DateTime<Utc>, retention: Duration) -> usize {
        let mut removed = 0;
        for venues in self.quotes.values_mut() {
            let before = venues.len();
            venues.retain(|_, q| now.signed_duration_since(q.observed_at) <= retention);
            removed += before - venues.len();
        }
        self.quotes.retain(|_, venues| !venues.is_empty());
        removed
    }

    pub fn len(&self) -> usize {
        self.quotes.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationStats {
    pub accepted: u64,
    pub rejected: u64,
}

pub struct PriceValidator {
    config: ValidatorConfig,
    history: HashMap<QuoteKey, PriceHistoryEntry>,
    table: PriceTable,
    stats: ValidationStats,
}

impl PriceValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self {
            config,
            history: HashMap::new(),
            table: PriceTable::default(),
            stats: ValidationStats::default(),
        }
    }

    /// Checks a quote for (asset, venue). Acceptance records it as the new
    /// reference price; rejection leaves all state untouched.
    pub fn validate(
        &mut self,
        asset: &Asset,
        venue: &Venue,
        quote: Option<&Quote>,
        now: DateTime<Utc>,
    ) -> Validation {
        match self.check(asset, venue, quote, now) {
            Err(reason) => {
                self.stats.rejected += 1;
                warn!(asset = %asset, venue = %venue, reason = %reason, "Quote rejected");
                Validation::Rejected(reason)
            }
            Ok(quote) => {
                self.stats.accepted += 1;
                self.history.insert(quote.key(), PriceHistoryEntry::from(quote));
                self.table.upsert(quote.clone());
                self.prune_history(now);
                Validation::Accepted
            }
        }
    }

    fn check<'q>(
        &self,
        asset: &Asset,
        venue: &Venue,
        quote: Option<&'q Quote>,
        now: DateTime<Utc>,
    ) -> Result<&'q Quote, RejectionReason> {
        let quote = quote.ok_or(RejectionReason::MissingQuote)?;

        if &quote.asset != asset || &quote.venue != venue {
            return Err(RejectionReason::KeyMismatch);
        }
        if quote.price <= Decimal::ZERO {
            return Err(RejectionReason::NonPositivePrice { price: quote.price });
        }
        if quote.confidence < self.config.min_confidence {
            return Err(RejectionReason::LowConfidence {
                confidence: quote.confidence,
                minimum: self.config.min_confidence,
            });
        }

        let age = quote.age(now);
        if age > self.config.freshness {
            return Err(RejectionReason::Stale {
                age_secs: age.num_seconds(),
                max_age_secs: self.config.freshness.num_seconds(),
            });
        }

        if let Some(prior) = self.history.get(&(asset.clone(), venue.clone())) {
            if let Some(deviation) = percent_change(prior.price, quote.price) {
                if deviation > self.config.max_deviation_percent {
                    return Err(RejectionReason::Deviation {
                        deviation_percent: deviation,
                        max_percent: self.config.max_deviation_percent,
                    });
                }
            }
        }

        Ok(quote)
    }

    /// Drops history and table entries older than the retention window.
    pub fn prune_history(&mut self, now: DateTime<Utc>) -> usize {
        let retention = self.config.history_retention;
        let before = self.history.len();
        self.history
            .retain(|_, entry| now.signed_duration_since(entry.timestamp) <= retention);
        let removed = before - self.history.len();
        let table_removed = self.table.prune(now, retention);
        if removed > 0 || table_removed > 0 {
            debug!(history = removed, quotes = table_removed, "Pruned expired price data");
        }
        removed
    }

    pub fn history_entry(&self, asset: &Asset, venue: &Venue) -> Option<&PriceHistoryEntry> {
        self.history.get(&(asset.clone(), venue.clone()))
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn live_quotes(&self, asset: &Asset, now: DateTime<Utc>) -> Vec<Quote> {
        self.table.live_quotes(asset, now, self.config.freshness)
    }

    pub fn table(&self) -> &PriceTable {
        &self.table
    }

    pub fn stats(&self) -> &ValidationStats {
        &self.stats
    }
}
