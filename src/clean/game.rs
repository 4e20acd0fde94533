use super::{Cleaned, Cleaner, Upstream, apply_date_floor, coerce_int_columns, dedup, parse_date_column};
use crate::catalog::TableKind;
use crate::error::Result;
use crate::metrics::{Anomaly, TableMetrics};
use crate::split::SideSplitter;
use crate::stats;
use crate::table::{Table, Value};

/// Columns repeated on both the home and away row of a game.
pub const COMMON_COLUMNS: &[&str] = &["season_id", "game_id", "game_date", "season_type"];

/// One game per key; the first row wins.
pub const DEDUP_KEY: &[&str] = &["game_id", "team_id_home", "team_id_away"];

/// Filled with the column median over the rows that survive the date floor.
pub const MEDIAN_IMPUTED: &[&str] = &["ft_pct_home", "ft_pct_away", "fg3_pct_home"];

/// Filled with the column mode.
pub const MODE_IMPUTED: &[&str] = &["wl_home", "wl_away"];

/// Counting stats stored as integers after the split.
pub const INT_COLUMNS: &[&str] = &[
    "min", "fgm", "fga", "fg3m", "fg3a", "ftm", "fta", "oreb", "dreb", "reb", "ast", "stl", "blk",
    "tov", "pf", "pts", "plus_minus",
];

pub struct GameCleaner;

impl Cleaner for GameCleaner {
    fn kind(&self) -> TableKind {
        TableKind::Game
    }

    fn clean(&self, raw: &Table, _upstream: &Upstream<'_>) -> Result<Cleaned> {
        clean_game(raw)
    }
}

/// Filter to the modern era, impute, deduplicate, and split each game into a
/// home row and an away row tagged in `team_side`.
///
/// # Errors
/// `SchemaMismatch` if a date, imputed, key, or common column is missing.
pub fn clean_game(raw: &Table) -> Result<Cleaned> {
    let mut metrics = TableMetrics::new(raw.len());
    let mut table = raw.clone();

    parse_date_column(&mut table, "game_date", &mut metrics)?;
    apply_date_floor(&mut table, "game_date", &mut metrics)?;

    for column in MEDIAN_IMPUTED {
        let median = stats::median(table.column(column)?);
        if let Some(m) = median {
            let filled = table.fill_nulls(column, &Value::Float(m))?;
            metrics.record(Anomaly::ImputedCell, filled);
        }
    }
    for column in MODE_IMPUTED {
        let mode = stats::mode(table.column(column)?);
        if let Some(m) = mode {
            let filled = table.fill_nulls(column, &m)?;
            metrics.record(Anomaly::ImputedCell, filled);
        }
    }

    dedup(&mut table, DEDUP_KEY, &mut metrics)?;

    let split = SideSplitter::home_away("team_side", COMMON_COLUMNS).split(&table)?;
    if !split.unclaimed.is_empty() {
        tracing::warn!(columns = ?split.unclaimed, "columns outside the home/away families dropped");
    }
    metrics.record(Anomaly::UnclaimedColumn, split.unclaimed.len());
    let mut table = split.table;

    coerce_int_columns(&mut table, INT_COLUMNS, &mut metrics)?;
    Ok(Cleaned::new(table, metrics))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(rows: Vec<Vec<Value>>) -> Table {
        Table::from_rows(
            "game",
            [
                "season_id", "team_id_home", "pts_home", "wl_home", "ft_pct_home", "fg3_pct_home",
                "game_id", "game_date", "min", "team_id_away", "pts_away", "wl_away", "ft_pct_away",
                "season_type",
            ],
            rows,
        )
    }

    fn row(game_id: &str, date: &str, pts_home: &str, wl_home: Option<&str>) -> Vec<Value> {
        vec![
            "21996".into(), "1".into(), pts_home.into(), wl_home.into(), "0.7".into(), "0.3".into(),
            game_id.into(), date.into(), "240".into(), "2".into(), "90".into(), "L".into(),
            Value::Null, "Regular Season".into(),
        ]
    }

    #[test]
    fn splits_into_two_rows_per_game() {
        let out = clean_game(&raw(vec![
            row("1", "1996-11-01", "100", Some("W")),
            row("2", "1997-01-02 00:00:00", "88", Some("L")),
        ]))
        .unwrap();
        let t = &out.table;
        assert_eq!(t.len(), 4);
        assert_eq!(
            t.columns(),
            [
                "season_id", "game_id", "game_date", "season_type", "team_id", "pts", "wl",
                "ft_pct", "fg3_pct", "team_side"
            ]
        );
        assert_eq!(t.get(0, "team_side"), Some(&Value::from("home")));
        assert_eq!(t.get(2, "team_side"), Some(&Value::from("away")));
        assert_eq!(t.get(0, "pts"), Some(&Value::Int(100)));
        assert_eq!(t.get(2, "pts"), Some(&Value::Int(90)));
        assert_eq!(t.get(1, "game_date").unwrap().to_string(), "1997-01-02");
        assert_eq!(out.metrics.count(Anomaly::UnclaimedColumn), 1);
    }

    #[test]
    fn away_only_family_members_are_null_on_home_rows() {
        let out = clean_game(&raw(vec![row("1", "1996-11-01", "100", Some("W"))])).unwrap();
        assert_eq!(out.table.get(1, "fg3_pct"), Some(&Value::Null));
        assert_eq!(out.table.get(0, "fg3_pct"), Some(&Value::from("0.3")));
    }

    #[test]
    fn imputes_mode_over_filtered_rows() {
        let out = clean_game(&raw(vec![
            row("1", "1996-11-01", "100", Some("W")),
            row("2", "1996-11-02", "100", Some("W")),
            row("3", "1996-11-03", "100", None),
            row("4", "1990-01-01", "100", Some("L")),
            row("5", "1990-01-02", "100", Some("L")),
            row("6", "1990-01-03", "100", Some("L")),
        ]))
        .unwrap();
        assert_eq!(out.table.len(), 6);
        assert_eq!(out.table.get(2, "wl"), Some(&Value::from("W")));
        assert_eq!(out.metrics.count(Anomaly::BeforeDateFloor), 3);
    }

    #[test]
    fn all_null_median_column_stays_null() {
        let out = clean_game(&raw(vec![row("1", "1996-11-01", "100", Some("W"))])).unwrap();
        // ft_pct_away is null on every row
        assert_eq!(out.table.get(1, "ft_pct"), Some(&Value::Null));
    }
}
