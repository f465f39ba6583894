//! Report: console table, JSON and CSV export of aggregated records
//!
//! Reads `AggregatedRecord` fields only; nothing here feeds back into
//! the pipeline.

mod export;
mod table;

pub use export::{partition_file_name, CsvExporter, ExportRow};
pub use table::{format_currency, render_table, secondary_cell, truncate_name};

use eyre::{Result, WrapErr};

use crate::pipeline::AggregatedRecord;

/// Records as pretty-printed JSON
pub fn render_json(records: &[AggregatedRecord]) -> Result<String> {
    serde_json::to_string_pretty(records).wrap_err("Failed to serialize records")
}

/// Rewards as "label: x.xx%" joined by ", ", "None" when there are none
pub fn format_other_rewards(record: &AggregatedRecord) -> String {
    if record.other_rewards.is_empty() {
        return "None".to_string();
    }
    record
        .other_rewards
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
