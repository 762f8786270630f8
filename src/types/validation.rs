//! Validation result types

use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Validation {
    Accepted,
    Rejected(RejectionReason),
}

impl Validation {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Validation::Accepted)
    }

    pub fn rejection(&self) -> Option<&RejectionReason> {
        match self {
            Validation::Accepted => None,
            Validation::Rejected(reason) => Some(reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RejectionReason {
    MissingQuote,
    KeyMismatch,
    NonPositivePrice { price: Decimal },
    LowConfidence { confidence: u8, minimum: u8 },
    Stale { age_secs: i64, max_age_secs: i64 },
    Deviation { deviation_percent: Decimal, max_percent: Decimal },
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::MissingQuote => write!(f, "no price data"),
            RejectionReason::KeyMismatch => write!(f, "quote does not match requested asset/venue"),
            RejectionReason::NonPositivePrice { price } => write!(f, "non-positive price {}", price),
            RejectionReason::LowConfidence { confidence, minimum } => {
                write!(f, "confidence {} below minimum {}", confidence, minimum)
            }
            RejectionReason::Stale { age_secs, max_age_secs } => {
                write!(f, "quote is {}s old (max {}s)", age_secs, max_age_secs)
            }
            RejectionReason::Deviation { deviation_percent, max_percent } => write!(
                f,
                "price moved {:.2}% from last accepted (max {}%)",
                deviation_percent, max_percent
            ),
        }
    }
}
