//! Core data types and structures

pub mod asset;
pub mod quote;
pub mod opportunity;
pub mod position;
pub mod portfolio;
pub mod risk;
pub mod execution;
pub mod validation;

pub use asset::*;
pub use quote::*;
pub use opportunity::*;
pub use position::*;
pub use portfolio::*;
pub use risk::*;
pub use execution::*;
pub use validation::*;
