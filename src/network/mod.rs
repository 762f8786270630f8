//! Outbound price sources and retry handling

pub mod price_client;
pub mod retry;

pub use price_client::*;
pub use retry::*;
