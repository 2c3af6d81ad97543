//! Turn delimited text and JSON record arrays into [`Table`]s.
//!
//! Parsing lives outside the matching core; these loaders cover the common
//! cases so callers and tests don't each need their own.

use std::collections::HashSet;
use std::path::Path;

use serde_json::Value;

use crate::error::ReconcileError;
use crate::model::{CellValue, Record, Table};

/// Interpret one CSV field. Empty is `Blank`; text that round-trips through
/// `f64` unchanged is a `Number`; everything else (including `"0150"`) stays text.
pub fn parse_cell(raw: &str) -> CellValue {
    if raw.is_empty() {
        return CellValue::Blank;
    }
    match raw.parse::<f64>() {
        Ok(n) if n.is_finite() && n.to_string() == raw => CellValue::Number(n),
        _ => CellValue::Text(raw.to_string()),
    }
}

fn check_unique_headers(headers: &[String]) -> Result<(), ReconcileError> {
    let mut seen = HashSet::new();
    match headers.iter().find(|h| !seen.insert(h.as_str())) {
        Some(dup) => Err(ReconcileError::Csv(format!("duplicate column '{dup}'"))),
        None => Ok(()),
    }
}

pub fn table_from_csv_str(name: &str, data: &str) -> Result<Table, ReconcileError> {
    let data = data.strip_prefix('\u{feff}').unwrap_or(data);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ReconcileError::Csv(e.to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect();
    check_unique_headers(&headers)?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| ReconcileError::Csv(e.to_string()))?;
        let record: Record = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), parse_cell(row.get(i).unwrap_or(""))))
            .collect();
        records.push(record);
    }

    log::debug!("loaded '{name}': {} columns, {} rows", headers.len(), records.len());
    Ok(Table::new(name, headers, records))
}

/// Load a CSV file. The table is named after the file.
pub fn table_from_csv_path(path: &Path) -> Result<Table, ReconcileError> {
    let data = std::fs::read_to_string(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    table_from_csv_str(&name, &data)
}

fn json_cell(value: &Value) -> CellValue {
    match value {
        Value::Null => CellValue::Blank,
        Value::Bool(b) => CellValue::Bool(*b),
        Value::Number(n) => n.as_f64().map_or_else(|| CellValue::Text(n.to_string()), CellValue::Number),
        Value::String(s) => CellValue::Text(s.clone()),
        other => CellValue::Text(other.to_string()),
    }
}

/// Load a JSON array of objects. Headers follow first-seen key order.
pub fn table_from_json_str(name: &str, data: &str) -> Result<Table, ReconcileError> {
    let rows: Vec<serde_json::Map<String, Value>> =
        serde_json::from_str(data).map_err(|e| ReconcileError::Json(e.to_string()))?;

    let mut seen = HashSet::new();
    let mut headers = Vec::new();
    let mut records = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut record = Record::with_capacity(row.len());
        for (k, v) in row {
            if seen.insert(k.clone()) {
                headers.push(k.clone());
            }
            record.insert(k.clone(), json_cell(v));
        }
        records.push(record);
    }

    log::debug!("loaded '{name}': {} columns, {} rows", headers.len(), records.len());
    Ok(Table::new(name, headers, records))
}
