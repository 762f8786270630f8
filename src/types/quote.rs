//! Canonical price quote and validation history types

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use super::{Asset, Venue};

pub const DEFAULT_QUOTE_CONFIDENCE: u8 = 90;

/// Lookup key for per-(asset, venue) state.
pub type QuoteKey = (Asset, Venue);

/// A single price observation from one venue. Superseded, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub asset: Asset,
    pub venue: Venue,
    pub price: Decimal,
    pub volume_24h: Decimal,
    pub confidence: u8, // 0-100
    pub observed_at: DateTime<Utc>,
}

impl Quote {
    pub fn new(asset: Asset, venue: Venue, price: Decimal, observed_at: DateTime<Utc>) -> Self {
        Self {
            asset,
            venue,
            price,
            volume_24h: Decimal::ZERO,
            confidence: DEFAULT_QUOTE_CONFIDENCE,
            observed_at,
        }
    }

    pub fn with_confidence(mut self, confidence: u8) -> Self {
        self.confidence = confidence.min(100);
        self
    }

    pub fn with_volume(mut self, volume_24h: Decimal) -> Self {
        self.volume_24h = volume_24h;
        self
    }

    pub fn key(&self) -> QuoteKey {
        (self.asset.clone(), self.venue.clone())
    }

    /// Age relative to `now`; quotes stamped in the future have zero age.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.observed_at).max(Duration::zero())
    }
}

/// Last accepted price for a key, used only for the deviation check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceHistoryEntry {
    pub asset: Asset,
    pub venue: Venue,
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl From<&Quote> for PriceHistoryEntry {
    fn from(quote: &Quote) -> Self {
        Self {
            asset: quote.asset.clone(),
            venue: quote.venue.clone(),
            price: quote.price,
            timestamp: quote.observed_at,
        }
    }
}
