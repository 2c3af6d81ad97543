use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Cells + records
// ---------------------------------------------------------------------------

/// A single cell as produced by the parsing collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Bool(bool),
    Number(f64),
    Text(String),
    #[default]
    Blank,
}

static BLANK: CellValue = CellValue::Blank;

impl CellValue {
    /// Stringify the cell. Never fails; `Blank` becomes the empty string.
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Blank => String::new(),
        }
    }

    /// `Blank` is the only non-present value. Empty text is present.
    pub fn is_present(&self) -> bool {
        !matches!(self, Self::Blank)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Blank => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// One row: column name -> cell. A missing column reads as `Blank`.
pub type Record = HashMap<String, CellValue>;

/// Look up a column, treating a missing entry as `Blank`.
pub fn cell<'a>(record: &'a Record, column: &str) -> &'a CellValue {
    record.get(column).unwrap_or(&BLANK)
}

/// A fully materialized input file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    /// Source file name; used for conflict tagging and the "Source File" column.
    pub name: String,
    pub headers: Vec<String>,
    pub records: Vec<Record>,
}

impl Table {
    pub fn new(name: impl Into<String>, headers: Vec<String>, records: Vec<Record>) -> Self {
        Self {
            name: name.into(),
            headers,
            records,
        }
    }

    pub fn row_count(&self) -> usize {
        self.records.len()
    }
}

// ---------------------------------------------------------------------------
// Clustering
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMember {
    pub record: Record,
    pub confidence: f64,
}

/// A representative plus every record matched to it, in input order.
/// The representative is always `members[0]` with confidence 1.0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchGroup {
    pub representative: Record,
    pub members: Vec<GroupMember>,
}

impl MatchGroup {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Dedup + compare
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DedupResult {
    pub duplicates: Vec<Record>,
    pub cleaned: Vec<Record>,
    pub total_duplicates: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompareResult {
    pub common: Vec<Record>,
    pub unique: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub record: Record,
    pub group_id: usize,
    pub is_original: bool,
    pub match_type: String,
    pub confidence: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateReport {
    pub rows: Vec<ReportRow>,
    pub total_duplicate_rows: usize,
    pub total_groups: usize,
}

// ---------------------------------------------------------------------------
// N-way
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NWayResult {
    /// Records whose key is present in every table, taken from the first table.
    pub intersection: Vec<Record>,
    /// One entry per input table, in call order.
    pub per_file_unique: Vec<Vec<Record>>,
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConflictValue {
    pub source_file: String,
    pub value: CellValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConflictField {
    pub column: String,
    pub values: Vec<ConflictValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeConflict {
    pub id: u64,
    pub primary_key_values: Record,
    pub fields: Vec<ConflictField>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeResult {
    pub merged_data: Vec<Record>,
    pub conflicts: Vec<MergeConflict>,
    pub headers: Vec<String>,
    /// Rows skipped because their merge key was empty.
    pub dropped_rows: usize,
}

/// Caller's choice for one conflicted column of one conflict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub conflict_id: u64,
    pub column: String,
    pub value: CellValue,
}
