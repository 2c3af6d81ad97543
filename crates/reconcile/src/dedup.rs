use crate::cluster::{cluster_indices, rows_match};
use crate::config::{MatchOptions, MatchingMode};
use crate::grouping::{composite_key, group_by_key};
use crate::model::{CellValue, CompareResult, DedupResult, DuplicateReport, Record, ReportRow, Table};

pub const GROUP_ID_COLUMN: &str = "Duplicate Group ID";
pub const IS_ORIGINAL_COLUMN: &str = "Is Original";
pub const MATCH_TYPE_COLUMN: &str = "Match Type";
pub const CONFIDENCE_COLUMN: &str = "Confidence Score";

/// Match type label for groups found by primary-key identity alone.
pub const PRIMARY_MATCH_TYPE: &str = "Exact (Primary)";

// ---------------------------------------------------------------------------
// Hierarchical grouping
// ---------------------------------------------------------------------------

/// Members of one match group with their confidence, canonical record first.
type Group<'a> = Vec<(&'a Record, f64)>;

/// Primary-key grouping, then secondary clustering within each primary group.
/// Singletons are included so every record lands in exactly one group.
fn find_groups<'a>(records: &'a [Record], options: &MatchOptions) -> Vec<Group<'a>> {
    let primary = &options.primary_columns;
    let secondary = &options.secondary_columns;

    if primary.is_empty() && secondary.is_empty() {
        return records.iter().map(|r| vec![(r, 1.0)]).collect();
    }

    if primary.is_empty() {
        let refs: Vec<&Record> = records.iter().collect();
        return split_clusters(&refs, options);
    }

    let mut groups: Vec<Group<'a>> = Vec::new();
    for (_, rows) in group_by_key(records, primary, &options.key_profile()).iter() {
        if rows.len() == 1 || secondary.is_empty() {
            groups.push(rows.iter().map(|r| (*r, 1.0)).collect());
        } else {
            groups.extend(split_clusters(rows, options));
        }
    }
    groups
}

fn split_clusters<'a>(rows: &[&'a Record], options: &MatchOptions) -> Vec<Group<'a>> {
    cluster_indices(rows, &options.secondary_columns, options)
        .into_iter()
        .map(|group| group.into_iter().map(|(i, c)| (rows[i], c)).collect())
        .collect()
}

// ---------------------------------------------------------------------------
// Single-file dedup
// ---------------------------------------------------------------------------

/// Split a table into canonical rows and their duplicates.
///
/// With no primary and no secondary columns the table passes through untouched.
/// The first member of every group is canonical; the rest are duplicates.
pub fn dedup_single_file(table: &Table, options: &MatchOptions) -> DedupResult {
    let mut cleaned = Vec::new();
    let mut duplicates = Vec::new();

    for group in find_groups(&table.records, options) {
        let mut members = group.into_iter();
        if let Some((first, _)) = members.next() {
            cleaned.push(first.clone());
        }
        duplicates.extend(members.map(|(r, _)| r.clone()));
    }

    log::debug!(
        "dedup '{}': {} rows -> {} cleaned, {} duplicates",
        table.name,
        table.row_count(),
        cleaned.len(),
        duplicates.len()
    );

    DedupResult {
        total_duplicates: duplicates.len(),
        duplicates,
        cleaned,
    }
}

// ---------------------------------------------------------------------------
// Two-file compare
// ---------------------------------------------------------------------------

/// Partition `comparison` into rows that also occur in `main` and rows that don't.
///
/// Only `main` is indexed (by primary key); each comparison row is looked up in
/// that index and, when secondary columns are set, must match one of the
/// bucket's rows under the configured mode. Not symmetric.
pub fn compare_files(main: &Table, comparison: &Table, options: &MatchOptions) -> CompareResult {
    let key_profile = options.key_profile();
    let buckets = group_by_key(&main.records, &options.primary_columns, &key_profile);

    let mut common = Vec::new();
    let mut unique = Vec::new();

    for row in &comparison.records {
        let key = composite_key(row, &options.primary_columns, &key_profile);
        let found = match buckets.get(&key) {
            None => false,
            Some(_) if options.secondary_columns.is_empty() => true,
            Some(bucket) => bucket
                .iter()
                .any(|m| rows_match(row, m, &options.secondary_columns, options).is_some()),
        };
        if found {
            common.push(row.clone());
        } else {
            unique.push(row.clone());
        }
    }

    log::debug!(
        "compare '{}' against '{}': {} common, {} unique",
        comparison.name,
        main.name,
        common.len(),
        unique.len()
    );

    CompareResult { common, unique }
}

// ---------------------------------------------------------------------------
// Duplicate report
// ---------------------------------------------------------------------------

/// Every member of every group with more than one record, annotated with its
/// group id, whether it is the group's original, the match type and confidence.
pub fn duplicate_report(table: &Table, options: &MatchOptions) -> DuplicateReport {
    let primary_only = options.secondary_columns.is_empty();
    let match_type = if primary_only {
        PRIMARY_MATCH_TYPE
    } else {
        options.matching_mode.label()
    };
    let scored = !primary_only && options.matching_mode == MatchingMode::Fuzzy;

    let mut rows = Vec::new();
    let mut group_id = 0;

    for group in find_groups(&table.records, options) {
        if group.len() < 2 {
            continue;
        }
        group_id += 1;
        for (i, (record, confidence)) in group.into_iter().enumerate() {
            rows.push(ReportRow {
                record: record.clone(),
                group_id,
                is_original: i == 0,
                match_type: match_type.to_string(),
                confidence: if scored {
                    format_confidence(confidence)
                } else {
                    "100%".to_string()
                },
            });
        }
    }

    log::debug!(
        "duplicate report '{}': {} rows in {} groups",
        table.name,
        rows.len(),
        group_id
    );

    DuplicateReport {
        total_duplicate_rows: rows.len(),
        total_groups: group_id,
        rows,
    }
}

fn format_confidence(confidence: f64) -> String {
    format!("{}%", (confidence * 100.0).round() as i64)
}

impl ReportRow {
    /// The record extended with the report's metadata columns.
    pub fn to_record(&self) -> Record {
        let mut record = self.record.clone();
        record.insert(GROUP_ID_COLUMN.into(), CellValue::Number(self.group_id as f64));
        record.insert(IS_ORIGINAL_COLUMN.into(), CellValue::Bool(self.is_original));
        record.insert(MATCH_TYPE_COLUMN.into(), CellValue::Text(self.match_type.clone()));
        record.insert(CONFIDENCE_COLUMN.into(), CellValue::Text(self.confidence.clone()));
        record
    }
}

impl DuplicateReport {
    /// Source headers followed by the metadata columns.
    pub fn headers(table_headers: &[String]) -> Vec<String> {
        let mut headers = table_headers.to_vec();
        headers.extend(
            [GROUP_ID_COLUMN, IS_ORIGINAL_COLUMN, MATCH_TYPE_COLUMN, CONFIDENCE_COLUMN]
                .iter()
                .map(|s| s.to_string()),
        );
        headers
    }

    pub fn to_records(&self) -> Vec<Record> {
        self.rows.iter().map(ReportRow::to_record).collect()
    }
}
