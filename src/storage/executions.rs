//! Trade execution storage

use anyhow::Result;
use std::path::Path;
use tracing::info;
use crate::types::ExecutionOutcome;
use super::append_jsonl;

pub fn save_execution_outcome(output_dir: &Path, outcome: &ExecutionOutcome) -> Result<()> {
    append_jsonl(output_dir, "executions", "trades", outcome.timestamp, outcome)?;

    info!(
        trade_id = %outcome.trade_id,
        status = ?outcome.status,
        position_id = ?outcome.position_id,
        "Saved trade execution"
    );

    Ok(())
}
