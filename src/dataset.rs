//! In-memory tabular dataset.
//!
//! A dataset is an ordered list of column names plus rows of JSON scalar
//! cells. Cells loaded from CSV are inferred: empty text becomes `Null`,
//! integer and float text become numbers, anything else stays a string.
//! Short rows are padded with `Null` so every row has one cell per column.

use serde_json::{Map, Number, Value};
use std::collections::HashMap;
use std::path::Path;

use crate::{RainAlertError, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Build a dataset from column names and rows. Rows are padded or
    /// truncated to the column count.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Value::Null);
                row
            })
            .collect();
        Dataset { columns, index, rows }
    }

    /// Build a dataset from JSON objects; the column order follows first
    /// appearance across all rows and missing keys become `Null`.
    pub fn from_records(records: &[Map<String, Value>]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in records {
            for key in record.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|c| record.get(c).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();
        Dataset::new(columns, rows)
    }

    /// Load a CSV file with a header row.
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|e| RainAlertError::io(format!("reading {}", path.display()), e))?;
        Self::from_csv_reader(file)
    }

    pub fn from_csv_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let columns: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(infer_cell).collect());
        }
        Ok(Dataset::new(columns, rows))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Values of one column, or `None` if the column is absent.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let i = *self.index.get(name)?;
        Some(self.rows.iter().map(|row| &row[i]).collect())
    }

    /// Numeric view of a column: one entry per row, `None` where the cell is
    /// not numeric. An absent column yields all `None`.
    pub fn numeric_column(&self, name: &str) -> Vec<Option<f64>> {
        match self.index.get(name) {
            Some(&i) => self.rows.iter().map(|row| as_number(&row[i])).collect(),
            None => vec![None; self.rows.len()],
        }
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Value> {
        let i = *self.index.get(column)?;
        self.rows.get(row).map(|r| &r[i])
    }

    /// Copy of the dataset without the named columns. Unknown names are
    /// ignored.
    pub fn drop_columns(&self, drop: &[&str]) -> Dataset {
        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|&i| !drop.contains(&self.columns[i].as_str()))
            .collect();
        let columns = keep.iter().map(|&i| self.columns[i].clone()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| keep.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Dataset::new(columns, rows)
    }

    /// Row as a JSON object keyed by column name.
    pub fn row_record(&self, row: usize) -> Value {
        let mut record = Map::new();
        if let Some(cells) = self.rows.get(row) {
            for (name, cell) in self.columns.iter().zip(cells) {
                record.insert(name.clone(), cell.clone());
            }
        }
        Value::Object(record)
    }
}

/// Infer a JSON scalar from CSV cell text.
pub fn infer_cell(text: &str) -> Value {
    if text.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = text.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Ok(f) = text.parse::<f64>() {
        if let Some(n) = Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    Value::String(text.to_string())
}

/// Render a JSON scalar as CSV cell text.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Numeric coercion: numbers and numeric-looking strings are numeric,
/// everything else is not.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// A cell is missing when it is null or blank after trimming.
pub fn is_missing(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}
