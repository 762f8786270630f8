//! Trade execution simulation

use async_trait::async_trait;
use std::time::Duration;
use tracing::info;
use crate::errors::BotResult;
use crate::types::{ExecutionRequest, ExecutionResponse};
use super::ExecutionGateway;

/// Dry-run gateway: fills with a fixed probability after a short delay.
pub struct SimulatedGateway {
    fill_rate: f64,
    latency: Duration,
}

impl SimulatedGateway {
    pub fn new(fill_rate: f64, latency: Duration) -> Self {
        Self {
            fill_rate: fill_rate.clamp(0.0, 1.0),
            latency,
        }
    }
}

#[async_trait]
impl ExecutionGateway for SimulatedGateway {
    async fn submit(&self, request: &ExecutionRequest) -> BotResult<ExecutionResponse> {
        tokio::time::sleep(self.latency).await;

        let is_successful = rand::random::<f64>() < self.fill_rate;

        info!(
            "🎭 Simulated execution: {} {} buy@{} on {} sell@{} on {}, success={}",
            request.size,
            request.asset,
            request.buy_price,
            request.buy_venue,
            request.sell_price,
            request.sell_venue,
            is_successful
        );

        if is_successful {
            Ok(ExecutionResponse::filled(format!("sim-{}", uuid::Uuid::new_v4().simple())))
        } else {
            Ok(ExecutionResponse::declined("Simulated fill failure"))
        }
    }
}
