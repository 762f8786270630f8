//! Risk alert storage

use anyhow::Result;
use std::path::Path;
use crate::types::Alert;
use super::append_jsonl;

pub fn save_alert(output_dir: &Path, alert: &Alert) -> Result<()> {
    append_jsonl(output_dir, "alerts", "risk", alert.timestamp, alert)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AlertCategory, AlertType};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    #[test]
    fn test_alert_written_as_json_line() {
        let dir = tempfile::tempdir().unwrap();
        let alert = Alert {
            alert_type: AlertType::Emergency,
            category: AlertCategory::Drawdown,
            message: "drawdown at 96% of limit".into(),
            level: dec!(0.96),
            value: dec!(0.192),
            threshold: dec!(0.20),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
        };
        save_alert(dir.path(), &alert).unwrap();

        let contents =
            std::fs::read_to_string(dir.path().join("alerts/risk_2024-01-02.jsonl")).unwrap();
        let value: serde_json::Value = serde_json::from_str(contents.trim()).unwrap();
        assert_eq!(value["alert_type"], "Emergency");
        assert_eq!(value["category"], "Drawdown");
    }
}
