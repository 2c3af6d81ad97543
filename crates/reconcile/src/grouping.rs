use std::collections::HashMap;

use crate::model::{cell, Record};
use crate::normalize::{KeyProfile, Profile};

/// Joins column values into a composite key.
pub const KEY_SEPARATOR: &str = "\u{1f}\u{1e}";

const KEY_ESCAPE: char = '\u{1f}';

/// Join key parts with [`KEY_SEPARATOR`]. A `\u{1f}` inside a part is doubled,
/// so separator-like text in a cell can never shift a part boundary.
pub fn join_key<I>(parts: I) -> String
where
    I: IntoIterator<Item = String>,
{
    let mut key = String::new();
    for (i, part) in parts.into_iter().enumerate() {
        if i > 0 {
            key.push_str(KEY_SEPARATOR);
        }
        for c in part.chars() {
            if c == KEY_ESCAPE {
                key.push(KEY_ESCAPE);
            }
            key.push(c);
        }
    }
    key
}

/// Normalize each of `columns` in order and join them with [`join_key`].
pub fn composite_key<P: Profile + ?Sized>(record: &Record, columns: &[String], profile: &P) -> String {
    join_key(columns.iter().map(|col| profile.normalize(cell(record, col))))
}

/// Records grouped by key, iterating in first-seen key order.
#[derive(Debug, Default)]
pub struct KeyedGroups<'a> {
    index: HashMap<String, usize>,
    groups: Vec<(String, Vec<&'a Record>)>,
}

impl<'a> KeyedGroups<'a> {
    pub fn push(&mut self, key: String, record: &'a Record) {
        match self.index.get(&key) {
            Some(&i) => self.groups[i].1.push(record),
            None => {
                self.index.insert(key.clone(), self.groups.len());
                self.groups.push((key, vec![record]));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&[&'a Record]> {
        self.index.get(key).map(|&i| self.groups[i].1.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[&'a Record])> {
        self.groups.iter().map(|(k, rows)| (k.as_str(), rows.as_slice()))
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Single pass over `records`, grouping by primary key. Only a [`KeyProfile`] is
/// accepted: primary keys are never case-folded.
pub fn group_by_key<'a>(records: &'a [Record], columns: &[String], profile: &KeyProfile) -> KeyedGroups<'a> {
    let mut groups = KeyedGroups::default();
    for record in records {
        groups.push(composite_key(record, columns, profile), record);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellValue;
    use crate::normalize::Normalization;

    fn rec(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), CellValue::from(*v)))
            .collect()
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn key_follows_column_order() {
        let r = rec(&[("a", "1"), ("b", "2")]);
        let n = Normalization {
            case_sensitive: true,
            trim_whitespace: false,
            strip_non_alphanumeric: false,
        };
        let ab = composite_key(&r, &cols(&["a", "b"]), &n);
        let ba = composite_key(&r, &cols(&["b", "a"]), &n);
        assert_eq!(ab, format!("1{KEY_SEPARATOR}2"));
        assert_ne!(ab, ba);
    }

    #[test]
    fn separator_keeps_keys_distinct() {
        let n = Normalization {
            case_sensitive: true,
            trim_whitespace: false,
            strip_non_alphanumeric: false,
        };
        let c = cols(&["a", "b"]);
        let k1 = composite_key(&rec(&[("a", "ab"), ("b", "c")]), &c, &n);
        let k2 = composite_key(&rec(&[("a", "a"), ("b", "bc")]), &c, &n);
        assert_ne!(k1, k2);
    }

    #[test]
    fn separator_inside_cell_text_is_escaped() {
        let n = Normalization {
            case_sensitive: true,
            trim_whitespace: false,
            strip_non_alphanumeric: false,
        };
        let c = cols(&["a", "b"]);
        let left = format!("x{KEY_SEPARATOR}y");
        let right = format!("y{KEY_SEPARATOR}z");
        let k1 = composite_key(&rec(&[("a", left.as_str()), ("b", "z")]), &c, &n);
        let k2 = composite_key(&rec(&[("a", "x"), ("b", right.as_str())]), &c, &n);
        assert_ne!(k1, k2);
        assert_eq!(join_key(["a".to_string(), "b".to_string()]), format!("a{KEY_SEPARATOR}b"));
        assert_eq!(join_key(["\u{1f}".to_string()]), "\u{1f}\u{1f}");
    }

    #[test]
    fn first_seen_order_and_case_kept() {
        let records = vec![
            rec(&[("id", "B")]),
            rec(&[("id", "a")]),
            rec(&[("id", " B ")]),
            rec(&[("id", "A")]),
        ];
        let groups = group_by_key(&records, &cols(&["id"]), &KeyProfile::new(true, false));
        let keys: Vec<&str> = groups.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["B", "a", "A"]);
        assert_eq!(groups.get("B").unwrap().len(), 2);
        assert!(std::ptr::eq(groups.get("B").unwrap()[1], &records[2]));
        assert_eq!(groups.len(), 3);
    }

    #[test]
    fn empty_columns_single_group() {
        let records = vec![rec(&[("id", "1")]), rec(&[("id", "2")])];
        let groups = group_by_key(&records, &[], &KeyProfile::new(true, false));
        assert_eq!(groups.len(), 1);
        assert_eq!(groups.get("").unwrap().len(), 2);
    }
}
