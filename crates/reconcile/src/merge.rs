use std::collections::{HashMap, HashSet};

use crate::config::MergeOptions;
use crate::grouping::join_key;
use crate::model::{
    cell, CellValue, ConflictField, ConflictValue, MergeConflict, MergeResult, Record, Resolution, Table,
};
use crate::normalize::{normalize, Normalization};

pub const SOURCE_FILE_COLUMN: &str = "Source File";

/// "Source File" value stamped on rows assembled by conflict resolution.
pub const MULTIPLE_SOURCES: &str = "Multiple";

/// Join the key columns' values. Raw stringification unless a key normalization
/// is given. `None` when there are no key columns or every part is empty.
fn merge_key(record: &Record, key_columns: &[String], normalization: Option<&Normalization>) -> Option<String> {
    if key_columns.is_empty() {
        return None;
    }
    let parts: Vec<String> = key_columns
        .iter()
        .map(|c| match normalization {
            Some(n) => normalize(cell(record, c), n),
            None => cell(record, c).to_text(),
        })
        .collect();
    if parts.iter().all(|p| p.is_empty()) {
        return None;
    }
    Some(join_key(parts))
}

/// Union of all headers in first-seen order, plus "Source File" when requested.
fn union_headers(tables: &[Table], add_source_column: bool) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut headers = Vec::new();
    for header in tables.iter().flat_map(|t| &t.headers) {
        if seen.insert(header.as_str()) {
            headers.push(header.clone());
        }
    }
    if add_source_column && !seen.contains(SOURCE_FILE_COLUMN) {
        headers.push(SOURCE_FILE_COLUMN.to_string());
    }
    headers
}

/// Canonical row for one merge key.
struct Entry {
    record: Record,
    source: String,
    /// Index into the conflict list once any field has conflicted.
    conflict: Option<usize>,
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// Merge tables on `key_columns`, detecting per-field conflicts.
///
/// Tables are processed in call order, rows in table order. The first row for a
/// key is canonical and is never modified by later rows. When a later row holds
/// a different present value for a non-key field, the key is moved out of
/// `merged_data` into a [`MergeConflict`] that collects every differing value
/// with its source file. Rows with an empty key are dropped and counted.
pub fn merge_files(tables: &[Table], key_columns: &[String], options: &MergeOptions) -> MergeResult {
    let headers = union_headers(tables, options.add_source_column);
    let compare_columns: Vec<&String> = headers
        .iter()
        .filter(|h| !key_columns.contains(h) && h.as_str() != SOURCE_FILE_COLUMN)
        .collect();
    let key_norm = options.key_normalization();

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut entries: Vec<Entry> = Vec::new();
    let mut conflicts: Vec<MergeConflict> = Vec::new();
    let mut next_id = 1;
    let mut dropped_rows = 0;

    for table in tables {
        for row in &table.records {
            let Some(key) = merge_key(row, key_columns, key_norm.as_ref()) else {
                dropped_rows += 1;
                continue;
            };

            let Some(&i) = index.get(&key) else {
                let mut record = row.clone();
                if options.add_source_column {
                    record.insert(SOURCE_FILE_COLUMN.into(), CellValue::Text(table.name.clone()));
                }
                index.insert(key, entries.len());
                entries.push(Entry {
                    record,
                    source: table.name.clone(),
                    conflict: None,
                });
                continue;
            };

            let entry = &mut entries[i];
            for &col in &compare_columns {
                let existing = cell(&entry.record, col);
                let incoming = cell(row, col);
                if !existing.is_present() || !incoming.is_present() {
                    continue;
                }
                if existing.to_text() == incoming.to_text() {
                    continue;
                }

                let ci = match entry.conflict {
                    Some(ci) => ci,
                    None => {
                        conflicts.push(MergeConflict {
                            id: next_id,
                            primary_key_values: key_columns
                                .iter()
                                .map(|c| (c.clone(), cell(&entry.record, c).clone()))
                                .collect(),
                            fields: Vec::new(),
                        });
                        next_id += 1;
                        entry.conflict = Some(conflicts.len() - 1);
                        conflicts.len() - 1
                    }
                };

                let fields = &mut conflicts[ci].fields;
                let fi = match fields.iter().position(|f| &f.column == col) {
                    Some(fi) => fi,
                    None => {
                        fields.push(ConflictField {
                            column: col.clone(),
                            values: Vec::new(),
                        });
                        fields.len() - 1
                    }
                };
                let field = &mut fields[fi];
                field.values.push(ConflictValue {
                    source_file: entry.source.clone(),
                    value: existing.clone(),
                });
                field.values.push(ConflictValue {
                    source_file: table.name.clone(),
                    value: incoming.clone(),
                });
            }
        }
    }

    // Dedup (file, value) pairs; a field whose values collapse to one was a
    // false conflict. A conflict left without fields goes back to the merge.
    let mut resolved_back = HashSet::new();
    for (ci, conflict) in conflicts.iter_mut().enumerate() {
        for field in &mut conflict.fields {
            let mut seen = HashSet::new();
            field
                .values
                .retain(|v| seen.insert((v.source_file.clone(), v.value.to_text())));
        }
        conflict.fields.retain(|f| {
            let distinct: HashSet<String> = f.values.iter().map(|v| v.value.to_text()).collect();
            distinct.len() > 1
        });
        if conflict.fields.is_empty() {
            resolved_back.insert(ci);
        }
    }

    let merged_data: Vec<Record> = entries
        .into_iter()
        .filter(|e| e.conflict.map_or(true, |ci| resolved_back.contains(&ci)))
        .map(|e| e.record)
        .collect();
    conflicts.retain(|c| !c.fields.is_empty());

    if dropped_rows > 0 {
        log::warn!("merge dropped {dropped_rows} row(s) with an empty key on {key_columns:?}");
    }
    log::debug!(
        "merged {} tables: {} rows, {} conflicts",
        tables.len(),
        merged_data.len(),
        conflicts.len()
    );

    MergeResult {
        merged_data,
        conflicts,
        headers,
        dropped_rows,
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// First present value of `column` among source rows carrying `key`.
fn first_available(
    tables: &[Table],
    key_columns: &[String],
    key: &str,
    column: &str,
    normalization: Option<&Normalization>,
) -> Option<CellValue> {
    tables
        .iter()
        .flat_map(|t| &t.records)
        .filter(|r| merge_key(r, key_columns, normalization).as_deref() == Some(key))
        .map(|r| cell(r, column))
        .find(|v| v.is_present())
        .cloned()
}

/// Build the final dataset: merged rows followed by one row per conflict.
///
/// Each conflict row starts from its primary-key values. A conflicted column
/// takes the caller's resolution and stays absent without one; any other
/// column takes the first value found in the source tables.
pub fn apply_resolutions(
    result: &MergeResult,
    source_tables: &[Table],
    key_columns: &[String],
    resolutions: &[Resolution],
    options: &MergeOptions,
) -> Vec<Record> {
    let chosen: HashMap<(u64, &str), &CellValue> = resolutions
        .iter()
        .map(|r| ((r.conflict_id, r.column.as_str()), &r.value))
        .collect();
    let key_norm = options.key_normalization();

    let mut rows = result.merged_data.clone();
    for conflict in &result.conflicts {
        let key = merge_key(&conflict.primary_key_values, key_columns, key_norm.as_ref());
        let conflicted: HashSet<&str> = conflict.fields.iter().map(|f| f.column.as_str()).collect();

        let mut row = conflict.primary_key_values.clone();
        for header in &result.headers {
            if key_columns.contains(header) || header == SOURCE_FILE_COLUMN {
                continue;
            }
            if let Some(value) = chosen.get(&(conflict.id, header.as_str())) {
                row.insert(header.clone(), (*value).clone());
            } else if !conflicted.contains(header.as_str()) {
                let found = key
                    .as_deref()
                    .and_then(|k| first_available(source_tables, key_columns, k, header, key_norm.as_ref()));
                if let Some(value) = found {
                    row.insert(header.clone(), value);
                }
            }
        }
        if options.add_source_column {
            row.insert(SOURCE_FILE_COLUMN.into(), CellValue::from(MULTIPLE_SOURCES));
        }
        rows.push(row);
    }

    log::debug!(
        "applied {} resolution(s) across {} conflict(s): {} final rows",
        resolutions.len(),
        result.conflicts.len(),
        rows.len()
    );
    rows
}
