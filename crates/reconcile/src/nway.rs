use crate::config::MatchOptions;
use crate::grouping::{composite_key, KeyedGroups};
use crate::model::{NWayResult, Record, Table};

/// Set reconciliation across any number of tables on exact composite keys.
///
/// The matching mode in `options` is ignored; only its normalization flags
/// apply. Within one table, a repeated key keeps its first record. The
/// intersection takes records from the first table; each table's unique set
/// holds keys found in no other table.
pub fn compare_n_way(tables: &[Table], columns: &[String], options: &MatchOptions) -> NWayResult {
    let profile = options.match_profile();
    let maps: Vec<KeyedGroups<'_>> = tables
        .iter()
        .map(|t| {
            let mut groups = KeyedGroups::default();
            for record in &t.records {
                groups.push(composite_key(record, columns, &profile), record);
            }
            groups
        })
        .collect();

    let intersection: Vec<Record> = match maps.split_first() {
        Some((first, rest)) => first
            .iter()
            .filter(|(key, _)| rest.iter().all(|m| m.get(key).is_some()))
            .map(|(_, rows)| rows[0].clone())
            .collect(),
        None => Vec::new(),
    };

    let per_file_unique: Vec<Vec<Record>> = maps
        .iter()
        .enumerate()
        .map(|(i, map)| {
            map.iter()
                .filter(|(key, _)| {
                    maps.iter()
                        .enumerate()
                        .all(|(j, other)| j == i || other.get(key).is_none())
                })
                .map(|(_, rows)| rows[0].clone())
                .collect()
        })
        .collect();

    log::debug!(
        "n-way compare over {} tables on {:?}: {} in intersection",
        tables.len(),
        columns,
        intersection.len()
    );

    NWayResult {
        intersection,
        per_file_unique,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchingMode;
    use crate::model::CellValue;

    fn table(name: &str, ids: &[&str]) -> Table {
        let records = ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                Record::from([
                    ("id".to_string(), CellValue::from(*id)),
                    ("row".to_string(), CellValue::from(i as i64)),
                ])
            })
            .collect();
        Table::new(name, vec!["id".into(), "row".into()], records)
    }

    fn ids(records: &[Record]) -> Vec<String> {
        records.iter().map(|r| r["id"].to_text()).collect()
    }

    #[test]
    fn three_way_sets() {
        let tables = vec![
            table("a", &["1", "2", "3", "4"]),
            table("b", &["2", "3", "5"]),
            table("c", &["3", "2", "6"]),
        ];
        let result = compare_n_way(&tables, &["id".to_string()], &MatchOptions::default());
        assert_eq!(ids(&result.intersection), vec!["2", "3"]);
        assert_eq!(result.per_file_unique.len(), 3);
        assert_eq!(ids(&result.per_file_unique[0]), vec!["1", "4"]);
        assert_eq!(ids(&result.per_file_unique[1]), vec!["5"]);
        assert_eq!(ids(&result.per_file_unique[2]), vec!["6"]);
    }

    #[test]
    fn first_occurrence_wins() {
        let tables = vec![table("a", &["1", "1"]), table("b", &["1"])];
        let result = compare_n_way(&tables, &["id".to_string()], &MatchOptions::default());
        assert_eq!(result.intersection.len(), 1);
        assert_eq!(result.intersection[0]["row"], CellValue::Number(0.0));
    }

    #[test]
    fn mode_is_always_exact() {
        let tables = vec![table("a", &["Smith"]), table("b", &["Smyth"])];
        let opts = MatchOptions {
            matching_mode: MatchingMode::Phonetic,
            ..MatchOptions::default()
        };
        let result = compare_n_way(&tables, &["id".to_string()], &opts);
        assert!(result.intersection.is_empty());
        assert_eq!(result.per_file_unique[0].len(), 1);
        assert_eq!(result.per_file_unique[1].len(), 1);
    }

    #[test]
    fn honors_case_folding() {
        let tables = vec![table("a", &["ABC"]), table("b", &["abc"])];
        let result = compare_n_way(&tables, &["id".to_string()], &MatchOptions::default());
        assert_eq!(result.intersection.len(), 1);
    }

    #[test]
    fn no_tables() {
        let result = compare_n_way(&[], &["id".to_string()], &MatchOptions::default());
        assert!(result.intersection.is_empty());
        assert!(result.per_file_unique.is_empty());
    }
}
