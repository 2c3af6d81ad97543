use crate::config::{ClusterStrategy, MatchOptions, MatchingMode};
use crate::model::{cell, GroupMember, MatchGroup, Record};
use crate::normalize::Profile;
use crate::similarity::{similarity, soundex};

/// Per-column comparable forms of a record under the configured mode:
/// normalized text (exact), case-folded text (fuzzy) or Soundex codes (phonetic).
fn comparable(record: &Record, columns: &[String], options: &MatchOptions) -> Vec<String> {
    let profile = options.match_profile();
    match options.matching_mode {
        MatchingMode::Exact => columns
            .iter()
            .map(|c| profile.normalize(cell(record, c)))
            .collect(),
        MatchingMode::Fuzzy => {
            let folded = profile.folded();
            columns
                .iter()
                .map(|c| folded.normalize(cell(record, c)))
                .collect()
        }
        MatchingMode::Phonetic => {
            let folded = profile.folded();
            columns
                .iter()
                .map(|c| soundex(&folded.normalize(cell(record, c))))
                .collect()
        }
    }
}

/// Compare two precomputed comparable vectors. `Some(confidence)` on a match.
fn compare(a: &[String], b: &[String], options: &MatchOptions) -> Option<f64> {
    if a.is_empty() {
        return None;
    }
    match options.matching_mode {
        MatchingMode::Exact | MatchingMode::Phonetic => (a == b).then_some(1.0),
        MatchingMode::Fuzzy => {
            let mut total = 0.0;
            for (x, y) in a.iter().zip(b) {
                let s = similarity(x, y);
                if s < options.fuzzy_threshold {
                    return None;
                }
                total += s;
            }
            Some(total / a.len() as f64)
        }
    }
}

/// Test whether two records match on `columns` under `options.matching_mode`.
///
/// Returns the match confidence: 1.0 for exact and phonetic matches, the mean
/// per-column similarity for fuzzy ones. An empty column list never matches.
pub fn rows_match(a: &Record, b: &Record, columns: &[String], options: &MatchOptions) -> Option<f64> {
    compare(
        &comparable(a, columns, options),
        &comparable(b, columns, options),
        options,
    )
}

/// Cluster by index. Each inner vec holds `(index, confidence)` with the
/// representative first.
pub(crate) fn cluster_indices(
    records: &[&Record],
    columns: &[String],
    options: &MatchOptions,
) -> Vec<Vec<(usize, f64)>> {
    let keys: Vec<Vec<String>> = records
        .iter()
        .map(|r| comparable(r, columns, options))
        .collect();
    let mut assigned = vec![false; records.len()];
    let mut groups = Vec::new();

    for i in 0..records.len() {
        if assigned[i] {
            continue;
        }
        assigned[i] = true;
        let mut group = vec![(i, 1.0)];

        for j in (i + 1)..records.len() {
            if assigned[j] {
                continue;
            }
            let Some(confidence) = compare(&keys[i], &keys[j], options) else {
                continue;
            };
            if options.cluster_strategy == ClusterStrategy::Mutual
                && !group[1..]
                    .iter()
                    .all(|&(m, _)| compare(&keys[m], &keys[j], options).is_some())
            {
                continue;
            }
            assigned[j] = true;
            group.push((j, confidence));
        }

        groups.push(group);
    }

    log::trace!(
        "clustered {} records into {} groups ({:?})",
        records.len(),
        groups.len(),
        options.matching_mode
    );
    groups
}

/// Partition `records` into match groups, in first-seen order.
///
/// Every unassigned record opens a group as its representative; later
/// unassigned records join when they match that representative. With
/// [`ClusterStrategy::Representative`] membership is decided against the
/// representative alone, so members need not match one another.
pub fn cluster(records: &[Record], columns: &[String], options: &MatchOptions) -> Vec<MatchGroup> {
    let refs: Vec<&Record> = records.iter().collect();
    cluster_indices(&refs, columns, options)
        .into_iter()
        .map(|group| MatchGroup {
            representative: records[group[0].0].clone(),
            members: group
                .into_iter()
                .map(|(i, confidence)| GroupMember {
                    record: records[i].clone(),
                    confidence,
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellValue;

    fn rec(col: &str, v: &str) -> Record {
        Record::from([(col.to_string(), CellValue::from(v))])
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn opts(mode: MatchingMode) -> MatchOptions {
        MatchOptions {
            matching_mode: mode,
            ..MatchOptions::default()
        }
    }

    #[test]
    fn exact_case_insensitive_groups() {
        let records = vec![rec("A", "foo"), rec("A", "FOO"), rec("A", "bar")];
        let groups = cluster(&records, &cols(&["A"]), &opts(MatchingMode::Exact));
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[1].len(), 1);
        assert_eq!(groups[0].representative, records[0]);
        assert_eq!(groups[0].members[1].confidence, 1.0);
    }

    #[test]
    fn exact_case_sensitive_splits() {
        let records = vec![rec("A", "foo"), rec("A", "FOO")];
        let o = MatchOptions {
            case_sensitive: true,
            ..opts(MatchingMode::Exact)
        };
        assert_eq!(cluster(&records, &cols(&["A"]), &o).len(), 2);
    }

    #[test]
    fn empty_columns_never_match() {
        let a = rec("A", "x");
        assert_eq!(rows_match(&a, &a, &[], &opts(MatchingMode::Exact)), None);
        let groups = cluster(&[a.clone(), a], &[], &opts(MatchingMode::Exact));
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn phonetic_ignores_case_setting() {
        let o = MatchOptions {
            case_sensitive: true,
            ..opts(MatchingMode::Phonetic)
        };
        let c = cols(&["n"]);
        assert_eq!(rows_match(&rec("n", "Robert"), &rec("n", "rupert"), &c, &o), Some(1.0));
        assert_eq!(rows_match(&rec("n", "Robert"), &rec("n", "Smith"), &c, &o), None);
    }

    #[test]
    fn fuzzy_confidence_is_mean() {
        let o = MatchOptions {
            fuzzy_threshold: 0.7,
            ..opts(MatchingMode::Fuzzy)
        };
        let c = cols(&["f", "l"]);
        let a = Record::from([
            ("f".to_string(), CellValue::from("John")),
            ("l".to_string(), CellValue::from("Smith")),
        ]);
        let b = Record::from([
            ("f".to_string(), CellValue::from("jon")),
            ("l".to_string(), CellValue::from("smith")),
        ]);
        let conf = rows_match(&a, &b, &c, &o).unwrap();
        assert!((conf - (0.75 + 1.0) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn fuzzy_any_column_below_threshold_fails() {
        let o = MatchOptions {
            fuzzy_threshold: 0.8,
            ..opts(MatchingMode::Fuzzy)
        };
        let c = cols(&["f"]);
        assert_eq!(rows_match(&rec("f", "john"), &rec("f", "jon"), &c, &o), None);
    }

    #[test]
    fn threshold_ignored_outside_fuzzy() {
        let o = MatchOptions {
            fuzzy_threshold: 1.0,
            ..opts(MatchingMode::Phonetic)
        };
        let c = cols(&["n"]);
        assert!(rows_match(&rec("n", "Smith"), &rec("n", "Smyth"), &c, &o).is_some());
    }

    #[test]
    fn representative_anchoring_is_not_transitive() {
        // "abcd" ~ "abce" (0.75) and "abcd" ~ "abdd" (0.75), but "abce" vs "abdd" = 0.5
        let records = vec![rec("x", "abcd"), rec("x", "abce"), rec("x", "abdd")];
        let o = MatchOptions {
            fuzzy_threshold: 0.75,
            ..opts(MatchingMode::Fuzzy)
        };
        let groups = cluster(&records, &cols(&["x"]), &o);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 3);

        let mutual = MatchOptions {
            cluster_strategy: ClusterStrategy::Mutual,
            ..o
        };
        let groups = cluster(&records, &cols(&["x"]), &mutual);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[1].representative, records[2]);
    }
}
