//! Data persistence and file operations
//!
//! Each record type is appended as one JSON line to a per-day file under
//! `<output_dir>/<kind>/`, which the dashboard tails.

pub mod opportunities;
pub mod executions;
pub mod alerts;

pub use opportunities::*;
pub use executions::*;
pub use alerts::*;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub(crate) fn append_jsonl<T: Serialize>(
    output_dir: &Path,
    kind: &str,
    prefix: &str,
    date: DateTime<Utc>,
    record: &T,
) -> Result<PathBuf> {
    let dir = output_dir.join(kind);
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    let filename = dir.join(format!("{}_{}.jsonl", prefix, date.format("%Y-%m-%d")));

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&filename)
        .with_context(|| format!("opening {}", filename.display()))?;

    writeln!(file, "{}", serde_json::to_string(record)?)?;
    Ok(filename)
}
