//! Wire format of pushed quote messages

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use crate::types::{Asset, Quote, Venue, DEFAULT_QUOTE_CONFIDENCE};
use crate::utils::time::from_unix;

/// A pushed quote as it arrives. Every field is optional here so that a
/// missing field can be reported by name.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundQuote {
    #[serde(default)]
    pub asset: Option<Asset>,
    #[serde(default, alias = "exchange")]
    pub venue: Option<Venue>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub timestamp: Option<f64>,
    #[serde(default)]
    pub volume_24h: Option<Decimal>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageDefect {
    MissingField(&'static str),
    InvalidTimestamp,
    InvalidConfidence,
}

impl std::fmt::Display for MessageDefect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageDefect::MissingField(name) => write!(f, "missing field `{}`", name),
            MessageDefect::InvalidTimestamp => write!(f, "invalid timestamp"),
            MessageDefect::InvalidConfidence => write!(f, "confidence outside 0-100"),
        }
    }
}

impl InboundQuote {
    /// Canonical quote; a missing timestamp means "observed on arrival".
    pub fn into_quote(self, received_at: DateTime<Utc>) -> Result<Quote, MessageDefect> {
        let asset = self.asset.ok_or(MessageDefect::MissingField("asset"))?;
        let venue = self.venue.ok_or(MessageDefect::MissingField("venue"))?;
        let price = self.price.ok_or(MessageDefect::MissingField("price"))?;

        let observed_at = match self.timestamp {
            Some(ts) => from_unix(ts).ok_or(MessageDefect::InvalidTimestamp)?,
            None => received_at,
        };

        let confidence = match self.confidence {
            Some(c) if c.is_finite() && (0.0..=100.0).contains(&c) => c.round() as u8,
            Some(_) => return Err(MessageDefect::InvalidConfidence),
            None => DEFAULT_QUOTE_CONFIDENCE,
        };

        Ok(Quote::new(asset, venue, price, observed_at)
            .with_volume(self.volume_24h.unwrap_or(Decimal::ZERO))
            .with_confidence(confidence))
    }
}
