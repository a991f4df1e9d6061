//! Exceptions table serialization.

use std::path::Path;

use crate::storage;
use crate::{ExceptionRecord, RainAlertError, Result};

/// Header of every exceptions CSV, in column order.
pub const EXCEPTION_COLUMNS: [&str; 7] = [
    "run_date",
    "check_name",
    "severity",
    "row_selector",
    "details",
    "n_rows_affected",
    "sample",
];

fn to_row(record: &ExceptionRecord) -> Vec<String> {
    vec![
        record.run_date.clone(),
        record.check_name.clone(),
        record.severity.to_string(),
        record.row_selector.clone(),
        record.details.clone(),
        record.n_rows_affected.to_string(),
        record.sample.clone(),
    ]
}

/// Write records in the given order. The header is written even when there
/// are no records.
pub fn write_exceptions(path: &Path, records: &[ExceptionRecord]) -> Result<()> {
    storage::write_text(path, &exceptions_to_csv(records)?)
}

/// Render records as CSV text with header.
pub fn exceptions_to_csv(records: &[ExceptionRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXCEPTION_COLUMNS)?;
    for record in records {
        writer.write_record(to_row(record))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| RainAlertError::io("rendering exceptions", e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| RainAlertError::Parse {
        context: "exceptions".to_string(),
        message: e.to_string(),
    })
}

/// Read an exceptions CSV back into records.
pub fn read_exceptions(path: &Path) -> Result<Vec<ExceptionRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for record in reader.deserialize() {
        records.push(record?);
    }
    Ok(records)
}
