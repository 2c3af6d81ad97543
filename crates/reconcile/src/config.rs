use std::collections::HashSet;

use serde::Deserialize;

use crate::error::ReconcileError;
use crate::normalize::{KeyProfile, MatchProfile, Normalization};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReconcileConfig {
    #[serde(default)]
    pub matching: MatchOptions,
    #[serde(default)]
    pub merge: MergeOptions,
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchingMode {
    #[default]
    Exact,
    Fuzzy,
    Phonetic,
}

impl MatchingMode {
    /// Label used in the `Match Type` report column.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Exact => "Exact",
            Self::Fuzzy => "Fuzzy",
            Self::Phonetic => "Phonetic",
        }
    }
}

impl std::fmt::Display for MatchingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// How a candidate joins a cluster.
///
/// `Representative` tests each candidate against the group's first record only,
/// so two members of one group may not match each other under fuzzy or phonetic
/// matching. `Mutual` additionally requires a match against every member
/// already admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterStrategy {
    #[default]
    Representative,
    Mutual,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatchOptions {
    pub case_sensitive: bool,
    pub trim_whitespace: bool,
    pub strip_non_alphanumeric: bool,
    pub matching_mode: MatchingMode,
    /// Only consulted when `matching_mode` is `Fuzzy`.
    pub fuzzy_threshold: f64,
    pub primary_columns: Vec<String>,
    pub secondary_columns: Vec<String>,
    pub cluster_strategy: ClusterStrategy,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            trim_whitespace: true,
            strip_non_alphanumeric: false,
            matching_mode: MatchingMode::Exact,
            fuzzy_threshold: 0.8,
            primary_columns: Vec::new(),
            secondary_columns: Vec::new(),
            cluster_strategy: ClusterStrategy::Representative,
        }
    }
}

impl MatchOptions {
    /// Profile for primary-key identity: never case-folds.
    pub fn key_profile(&self) -> KeyProfile {
        KeyProfile::new(self.trim_whitespace, self.strip_non_alphanumeric)
    }

    /// Profile for secondary matching: honors every flag.
    pub fn match_profile(&self) -> MatchProfile {
        MatchProfile::new(Normalization {
            case_sensitive: self.case_sensitive,
            trim_whitespace: self.trim_whitespace,
            strip_non_alphanumeric: self.strip_non_alphanumeric,
        })
    }

    pub fn validate(&self) -> Result<(), ReconcileError> {
        if !(0.0..=1.0).contains(&self.fuzzy_threshold) {
            return Err(ReconcileError::ConfigValidation(format!(
                "fuzzy_threshold must be within [0, 1], got {}",
                self.fuzzy_threshold
            )));
        }

        for (label, columns) in [
            ("primary_columns", &self.primary_columns),
            ("secondary_columns", &self.secondary_columns),
        ] {
            let mut seen = HashSet::new();
            for col in columns {
                if !seen.insert(col.as_str()) {
                    return Err(ReconcileError::ConfigValidation(format!(
                        "{label}: column '{col}' listed more than once"
                    )));
                }
            }
        }

        if let Some(col) = self
            .secondary_columns
            .iter()
            .find(|c| self.primary_columns.contains(c))
        {
            return Err(ReconcileError::ConfigValidation(format!(
                "column '{col}' is both a primary and a secondary column"
            )));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MergeOptions {
    /// Append a synthetic "Source File" column to merged rows.
    pub add_source_column: bool,
    /// Trim and case-fold key parts before joining. Off by default: merge keys
    /// are compared raw.
    pub normalize_keys: bool,
}

impl MergeOptions {
    /// Key profile applied to merge keys when `normalize_keys` is set.
    pub fn key_normalization(&self) -> Option<Normalization> {
        self.normalize_keys.then_some(Normalization {
            case_sensitive: false,
            trim_whitespace: true,
            strip_non_alphanumeric: false,
        })
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconcileConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconcileError> {
        let config: ReconcileConfig =
            toml::from_str(input).map_err(|e| ReconcileError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconcileError> {
        self.matching.validate()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
