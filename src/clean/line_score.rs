use super::{Cleaned, Cleaner, Upstream, apply_date_floor, coerce_int_columns, dedup, parse_date_column};
use crate::catalog::TableKind;
use crate::error::Result;
use crate::metrics::{Anomaly, TableMetrics};
use crate::split::SideSplitter;
use crate::table::{Table, Value};

pub const COMMON_COLUMNS: &[&str] = &["game_date", "game_id"];

pub const DEDUP_KEY: &[&str] = &["game_id", "team_id_home", "team_id_away"];

/// Per-side columns, without the side marker, in output order.
pub const FAMILY: &[&str] = &[
    "team_id",
    "team_abbreviation",
    "team_city_name",
    "team_nickname",
    "team_wins_losses",
    "pts_qtr1",
    "pts_qtr2",
    "pts_qtr3",
    "pts_qtr4",
    "pts_ot1",
    "pts_ot2",
    "pts_ot3",
    "pts_ot4",
    "pts_ot5",
    "pts_ot6",
    "pts_ot7",
    "pts_ot8",
    "pts_ot9",
    "pts_ot10",
    "pts",
];

pub const INT_COLUMNS: &[&str] = &[
    "pts_qtr1", "pts_qtr2", "pts_qtr3", "pts_qtr4", "pts_ot1", "pts_ot2", "pts_ot3", "pts_ot4",
    "pts_ot5", "pts_ot6", "pts_ot7", "pts_ot8", "pts_ot9", "pts_ot10", "pts", "team_id",
];

pub struct LineScoreCleaner;

impl Cleaner for LineScoreCleaner {
    fn kind(&self) -> TableKind {
        TableKind::LineScore
    }

    fn clean(&self, raw: &Table, _upstream: &Upstream<'_>) -> Result<Cleaned> {
        clean_line_score(raw)
    }
}

fn family(marker: &str) -> Vec<String> {
    FAMILY.iter().map(|c| format!("{c}{marker}")).collect()
}

/// Per-quarter scoring, one row per team per game, tagged in `local_visitante`.
///
/// A period with no points recorded is an overtime that was not played, so
/// every overtime column defaults to zero before the split.
///
/// # Errors
/// `SchemaMismatch` if `game_date_est`, a key column, or any enumerated
/// home/away column is missing.
pub fn clean_line_score(raw: &Table) -> Result<Cleaned> {
    let mut metrics = TableMetrics::new(raw.len());
    let mut table = raw.clone();

    parse_date_column(&mut table, "game_date_est", &mut metrics)?;
    let mut table = table.rename(&[("game_date_est", "game_date")])?;
    apply_date_floor(&mut table, "game_date", &mut metrics)?;

    let overtime: Vec<String> = table
        .columns()
        .iter()
        .filter(|c| c.contains("pts_ot"))
        .cloned()
        .collect();
    for column in &overtime {
        table.fill_nulls(column, &Value::Int(0))?;
    }

    dedup(&mut table, DEDUP_KEY, &mut metrics)?;

    let split = SideSplitter::new("local_visitante", COMMON_COLUMNS)
        .side_with_columns("home", "_home", &family("_home"))
        .side_with_columns("away", "_away", &family("_away"))
        .split(&table)?;
    if !split.unclaimed.is_empty() {
        tracing::warn!(columns = ?split.unclaimed, "columns outside the enumerated families dropped");
    }
    metrics.record(Anomaly::UnclaimedColumn, split.unclaimed.len());
    let mut table = split.table;

    coerce_int_columns(&mut table, INT_COLUMNS, &mut metrics)?;
    Ok(Cleaned::new(table, metrics))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> Table {
        let mut columns = vec!["game_date_est".to_string(), "game_sequence".to_string(), "game_id".to_string()];
        columns.extend(family("_home"));
        columns.extend(family("_away"));
        let mut row: Vec<Value> = vec!["2004-01-10T00:00:00".into(), "1".into(), "0020300500".into()];
        for side in [("10", "NJN", "101"), ("20", "LAL", "99")] {
            row.push(side.0.into());
            row.push(side.1.into());
            row.extend(["City", "Nick", "20-15", "25", "25", "25", "24"].map(Value::from));
            row.extend(std::iter::repeat_n(Value::Null, 10));
            row.push(side.2.into());
        }
        Table::from_rows("line_score", columns, vec![row])
    }

    #[test]
    fn enumerated_split_with_zeroed_overtime() {
        let out = clean_line_score(&raw()).unwrap();
        let t = &out.table;
        assert_eq!(t.len(), 2);
        assert_eq!(t.width(), COMMON_COLUMNS.len() + FAMILY.len() + 1);
        assert_eq!(t.columns().last().map(String::as_str), Some("local_visitante"));
        assert_eq!(t.get(0, "team_id"), Some(&Value::Int(10)));
        assert_eq!(t.get(1, "team_abbreviation"), Some(&Value::from("LAL")));
        assert_eq!(t.get(1, "pts_ot10"), Some(&Value::Int(0)));
        assert_eq!(t.get(0, "game_date").unwrap().to_string(), "2004-01-10");
        // game_sequence is in no family
        assert_eq!(out.metrics.count(Anomaly::UnclaimedColumn), 1);
        assert_eq!(out.metrics.count(Anomaly::ImputedCell), 0);
    }

    #[test]
    fn missing_enumerated_column_fails() {
        let raw = raw().drop_columns(&["pts_qtr3_away"]);
        let err = clean_line_score(&raw).unwrap_err();
        assert_eq!(err.kind(), "schema_mismatch");
    }
}
