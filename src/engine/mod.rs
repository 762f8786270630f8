//! Event-driven pipeline and its runtime

pub mod pipeline;
pub mod schedule;
pub mod runtime;

pub use pipeline::*;
pub use schedule::*;
pub use runtime::*;
