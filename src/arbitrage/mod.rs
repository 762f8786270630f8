//! Spread detection, scoring and retention of arbitrage opportunities

pub mod calculator;
pub mod detector;
pub mod scorer;
pub mod store;

pub use calculator::*;
pub use detector::*;
pub use scorer::*;
pub use store::*;
