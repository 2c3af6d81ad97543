//! `visigrid-reconcile` — Row matching, deduplication and merge engine.
//!
//! Pure engine crate: receives fully loaded tables, returns plain result
//! structures. Every operation is synchronous and never mutates its inputs.

pub mod cluster;
pub mod config;
pub mod dedup;
pub mod error;
pub mod grouping;
pub mod load;
pub mod merge;
pub mod model;
pub mod normalize;
pub mod nway;
pub mod similarity;

pub use cluster::{cluster, rows_match};
pub use config::{ClusterStrategy, MatchOptions, MatchingMode, MergeOptions, ReconcileConfig};
pub use dedup::{compare_files, dedup_single_file, duplicate_report};
pub use error::ReconcileError;
pub use merge::{apply_resolutions, merge_files};
pub use model::{
    CellValue, CompareResult, ConflictField, ConflictValue, DedupResult, DuplicateReport, MatchGroup,
    MergeConflict, MergeResult, NWayResult, Record, ReportRow, Resolution, Table,
};
pub use nway::compare_n_way;
