//! The external execution collaborator

use async_trait::async_trait;
use crate::errors::BotResult;
use crate::types::{ExecutionRequest, ExecutionResponse};

/// Places an approved trade on the venues. A declined order is a normal
/// response; `Err` is reserved for transport failures.
#[async_trait]
pub trait ExecutionGateway: Send + Sync {
    async fn submit(&self, request: &ExecutionRequest) -> BotResult<ExecutionResponse>;
}
