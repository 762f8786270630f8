//! Risk engine: sizing, exposure, metrics, alerts and position lifecycle

pub mod sizing;
pub mod exposure;
pub mod metrics;
pub mod alerts;
pub mod manager;

pub use sizing::*;
pub use exposure::*;
pub use metrics::*;
pub use alerts::*;
pub use manager::*;
