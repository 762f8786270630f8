//! Execution gateway seam and the simulated gateway

pub mod gateway;
pub mod simulation;

pub use gateway::*;
pub use simulation::*;
