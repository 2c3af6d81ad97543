//! Cell-to-comparable-string pipeline.
//!
//! Two profiles wrap the same pipeline. `KeyProfile` is used for primary-key
//! identity and never case-folds. `MatchProfile` is used for secondary matching
//! and honors every caller flag.

use crate::model::CellValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalization {
    pub case_sensitive: bool,
    pub trim_whitespace: bool,
    pub strip_non_alphanumeric: bool,
}

/// Normalize a cell: stringify, trim, strip to `[A-Za-z0-9]`, lower-case.
/// Steps run in that fixed order, each gated by its flag.
pub fn normalize(value: &CellValue, n: &Normalization) -> String {
    let mut s = value.to_text();
    if n.trim_whitespace {
        s = s.trim().to_string();
    }
    if n.strip_non_alphanumeric {
        s.retain(|c| c.is_ascii_alphanumeric());
    }
    if !n.case_sensitive {
        s.make_ascii_lowercase();
    }
    s
}

/// Anything that turns a cell into its comparable form.
pub trait Profile {
    fn normalization(&self) -> Normalization;

    fn normalize(&self, value: &CellValue) -> String {
        normalize(value, &self.normalization())
    }
}

/// Primary-key profile. Case is always significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyProfile {
    trim_whitespace: bool,
    strip_non_alphanumeric: bool,
}

impl KeyProfile {
    pub fn new(trim_whitespace: bool, strip_non_alphanumeric: bool) -> Self {
        Self {
            trim_whitespace,
            strip_non_alphanumeric,
        }
    }
}

impl Profile for KeyProfile {
    fn normalization(&self) -> Normalization {
        Normalization {
            case_sensitive: true,
            trim_whitespace: self.trim_whitespace,
            strip_non_alphanumeric: self.strip_non_alphanumeric,
        }
    }
}

/// Secondary-match profile. All flags come from the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchProfile {
    inner: Normalization,
}

impl MatchProfile {
    pub fn new(inner: Normalization) -> Self {
        Self { inner }
    }

    /// Same profile with case folding forced on (fuzzy and phonetic comparison).
    pub fn folded(&self) -> Self {
        Self {
            inner: Normalization {
                case_sensitive: false,
                ..self.inner
            },
        }
    }
}

impl Profile for MatchProfile {
    fn normalization(&self) -> Normalization {
        self.inner
    }
}

impl Profile for Normalization {
    fn normalization(&self) -> Normalization {
        *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(case_sensitive: bool, trim: bool, strip: bool) -> Normalization {
        Normalization {
            case_sensitive,
            trim_whitespace: trim,
            strip_non_alphanumeric: strip,
        }
    }

    #[test]
    fn blank_is_empty() {
        assert_eq!(normalize(&CellValue::Blank, &n(false, true, true)), "");
    }

    #[test]
    fn pipeline_order() {
        let v = CellValue::from("  Hello, World!  ");
        assert_eq!(normalize(&v, &n(true, false, false)), "  Hello, World!  ");
        assert_eq!(normalize(&v, &n(true, true, false)), "Hello, World!");
        assert_eq!(normalize(&v, &n(false, true, false)), "hello, world!");
        assert_eq!(normalize(&v, &n(false, false, true)), "helloworld");
    }

    #[test]
    fn strip_drops_non_ascii_letters() {
        let v = CellValue::from("Café-42");
        assert_eq!(normalize(&v, &n(true, false, true)), "Caf42");
    }

    #[test]
    fn numbers_are_stringified() {
        assert_eq!(normalize(&CellValue::Number(42.0), &n(false, true, false)), "42");
        assert_eq!(normalize(&CellValue::Number(-1.5), &n(false, true, true)), "15");
    }

    #[test]
    fn key_profile_keeps_case() {
        let key = KeyProfile::new(true, false);
        assert_eq!(key.normalize(&CellValue::from(" ABC ")), "ABC");
    }

    #[test]
    fn folded_match_profile() {
        let profile = MatchProfile::new(n(true, true, false));
        assert_eq!(profile.normalize(&CellValue::from("ABC")), "ABC");
        assert_eq!(profile.folded().normalize(&CellValue::from("ABC")), "abc");
    }
}
