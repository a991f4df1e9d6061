//! File persistence helpers. Every writer creates parent directories first.

use serde::Serialize;
use std::path::Path;

use crate::dataset::{cell_text, Dataset};
use crate::{RainAlertError, Result};

pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)
        .map_err(|e| RainAlertError::io(format!("creating {}", path.display()), e))
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}

/// Write a value as pretty-printed JSON (2-space indent, trailing newline).
pub fn write_json<T: Serialize + ?Sized>(path: &Path, payload: &T) -> Result<()> {
    ensure_parent(path)?;
    let mut text = serde_json::to_string_pretty(payload)?;
    text.push('\n');
    write_text(path, &text)
}

pub fn write_text(path: &Path, text: &str) -> Result<()> {
    ensure_parent(path)?;
    std::fs::write(path, text).map_err(|e| RainAlertError::io(format!("writing {}", path.display()), e))
}

/// Write a dataset as CSV with its header row, even when it has no rows.
pub fn write_dataset_csv(path: &Path, dataset: &Dataset) -> Result<()> {
    let rows: Vec<Vec<String>> = (0..dataset.row_count())
        .map(|i| {
            dataset
                .columns()
                .iter()
                .map(|c| dataset.cell(i, c).map(cell_text).unwrap_or_default())
                .collect()
        })
        .collect();
    write_csv(path, dataset.columns(), &rows)
}

/// Write a header and string rows as CSV.
pub fn write_csv<H: AsRef<str>>(path: &Path, header: &[H], rows: &[Vec<String>]) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(header.iter().map(|h| h.as_ref()))?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer
        .flush()
        .map_err(|e| RainAlertError::io(format!("writing {}", path.display()), e))
}

pub fn read_json(path: &Path) -> Result<serde_json::Value> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| RainAlertError::io(format!("reading {}", path.display()), e))?;
    Ok(serde_json::from_str(&text)?)
}
