//! Key-based left outer join of two tables.
//!
//! Every left row is kept. Matching right rows contribute the `attach`
//! columns; a left row with several matches is repeated once per match (the
//! same fan-out as a SQL left join), and a left row with none gets nulls.
//! Null keys never match. Output keeps left row order.

use crate::error::{EtlError, Result};
use crate::table::{Table, Value};
use std::collections::HashMap;

/// Output of [`left_join`].
#[derive(Debug, Clone, PartialEq)]
pub struct JoinOutput {
    pub table: Table,
    /// Left rows that found no match.
    pub misses: usize,
    /// Extra rows produced by keys that matched more than one right row.
    pub fan_out: usize,
}

/// Left join `left` to `right` on column `on`, appending `attach` columns from `right`.
///
/// # Errors
/// [`EtlError::SchemaMismatch`] if `on` is missing on either side or an
/// `attach` column is missing on the right; [`EtlError::ColumnConflict`] if an
/// `attach` column already exists on the left.
pub fn left_join(left: &Table, right: &Table, on: &str, attach: &[&str]) -> Result<JoinOutput> {
    let left_key = left.require(on)?;
    let right_key = right.require(on)?;
    let attach_idx = attach
        .iter()
        .map(|c| right.require(c))
        .collect::<Result<Vec<_>>>()?;
    if let Some(conflict) = attach.iter().find(|c| left.has_column(c)) {
        return Err(EtlError::ColumnConflict {
            table: left.name().to_string(),
            column: (*conflict).to_string(),
        });
    }

    let mut index: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, row) in right.rows().iter().enumerate() {
        if let Some(k) = row[right_key].key() {
            index.entry(k).or_default().push(i);
        }
    }

    let mut header: Vec<String> = left.columns().to_vec();
    header.extend(attach.iter().map(|c| (*c).to_string()));
    let mut out = Table::new(left.name(), header);
    let mut misses = 0;
    let mut fan_out = 0;

    for row in left.rows() {
        let matches = row[left_key].key().and_then(|k| index.get(&k));
        match matches {
            Some(hits) => {
                fan_out += hits.len() - 1;
                for &r in hits {
                    let right_row = &right.rows()[r];
                    let mut joined = row.clone();
                    joined.extend(attach_idx.iter().map(|&j| right_row[j].clone()));
                    out.push_row(joined);
                }
            }
            None => {
                misses += 1;
                let mut joined = row.clone();
                joined.extend(std::iter::repeat_n(Value::Null, attach_idx.len()));
                out.push_row(joined);
            }
        }
    }

    Ok(JoinOutput {
        table: out,
        misses,
        fan_out,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn teams() -> Table {
        Table::from_rows(
            "team",
            ["team_id", "team_name", "team_abbreviation"],
            vec![
                vec![Value::Int(1), "Lakers".into(), "LAL".into()],
                vec![Value::Int(2), "Nets".into(), "BKN".into()],
            ],
        )
    }

    #[test]
    fn keeps_unmatched_rows_with_nulls() {
        let left = Table::from_rows(
            "all_seasons",
            ["player_name", "team_abbreviation"],
            vec![
                vec!["A".into(), "LAL".into()],
                vec!["B".into(), "MEM".into()],
                vec!["C".into(), Value::Null],
            ],
        );
        let out = left_join(&left, &teams(), "team_abbreviation", &["team_id", "team_name"]).unwrap();
        assert_eq!(out.table.len(), 3);
        assert_eq!(out.misses, 2);
        assert_eq!(out.table.get(0, "team_id"), Some(&Value::Int(1)));
        assert_eq!(out.table.get(1, "team_name"), Some(&Value::Null));
        assert_eq!(out.table.get(2, "player_name"), Some(&Value::from("C")));
    }

    #[test]
    fn duplicate_right_keys_fan_out() {
        let mut right = teams();
        right.push_row(vec![Value::Int(3), "Other".into(), "LAL".into()]);
        let left = Table::from_rows("l", ["team_abbreviation"], vec![vec!["LAL".into()]]);
        let out = left_join(&left, &right, "team_abbreviation", &["team_id"]).unwrap();
        assert_eq!(out.table.len(), 2);
        assert_eq!(out.fan_out, 1);
    }

    #[test]
    fn rejects_attach_column_already_on_left() {
        let left = Table::new("l", ["team_abbreviation", "team_id"]);
        let err = left_join(&left, &teams(), "team_abbreviation", &["team_id"]).unwrap_err();
        assert!(matches!(err, EtlError::ColumnConflict { .. }));
    }
}
