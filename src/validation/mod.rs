//! Quote validation and the accepted-price table

pub mod price;

pub use price::*;
