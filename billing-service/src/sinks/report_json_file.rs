use std::{fs, path::Path};

use crate::pipeline::PipelineError;
use crate::report::BatchReport;

/// Write the batch report as pretty-printed JSON.
pub fn write_report(path: &Path, report: &BatchReport) -> Result<(), PipelineError> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| PipelineError::OutputWrite(format!("failed to encode batch report: {e}")))?;
    fs::write(path, json).map_err(|e| PipelineError::OutputWrite(format!("{}: {e}", path.display())))?;
    tracing::info!(path = %path.display(), "batch report written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_round_trips_through_json_file() {
        let path = std::env::temp_dir().join(format!("billing-report-{}.json", std::process::id()));
        let mut report = BatchReport {
            meters: 3,
            ..Default::default()
        };
        report.rows.record_header();
        report.rows.record_malformed(2, "invalid type 'x'");

        write_report(&path, &report).unwrap();

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["meters"], 3);
        assert_eq!(value["rows"]["malformed_rows"], 1);
        assert_eq!(value["rows"]["samples"][0]["position"], 2);
        assert_eq!(value["pairs"]["unknown_energy_type"], 0);

        let _ = std::fs::remove_file(&path);
    }
}
