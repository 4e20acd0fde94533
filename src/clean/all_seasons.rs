//! Player-season rows with canonical team identity attached.
//!
//! The source carries its own `team_id`/`team_name` columns, but they are not
//! trusted. Identity is rebuilt by joining on the team code after mapping
//! retired codes to current ones.

use super::{Cleaned, Cleaner, Upstream};
use crate::abbrev::{self, AbbreviationMap};
use crate::catalog::TableKind;
use crate::error::Result;
use crate::join::left_join;
use crate::metrics::{Anomaly, TableMetrics};
use crate::table::{Table, Value};
use std::collections::BTreeSet;

/// Header spellings of a positional index column written by a dataframe export.
pub const INDEX_COLUMNS: &[&str] = &["", "Unnamed: 0"];

pub const NO_COLLEGE: &str = "No College";

pub struct AllSeasonsCleaner;

impl Cleaner for AllSeasonsCleaner {
    fn kind(&self) -> TableKind {
        TableKind::AllSeasons
    }

    fn dependencies(&self) -> &'static [TableKind] {
        &[TableKind::Team]
    }

    fn clean(&self, raw: &Table, upstream: &Upstream<'_>) -> Result<Cleaned> {
        let teams = upstream.get(TableKind::AllSeasons, TableKind::Team)?;
        clean_all_seasons(raw, teams, AbbreviationMap::historical())
    }
}

/// Clean the player-season table and join it to the cleaned `teams`.
///
/// # Errors
/// `SchemaMismatch` if `college` or `team_abbreviation` is missing here, or
/// `teams` lacks `team_id`, `team_name` or `team_abbreviation`.
pub fn clean_all_seasons(raw: &Table, teams: &Table, codes: &AbbreviationMap) -> Result<Cleaned> {
    let mut metrics = TableMetrics::new(raw.len());
    let mut table = raw.clone().drop_columns(INDEX_COLUMNS);

    let filled = table.fill_nulls("college", &Value::from(NO_COLLEGE))?;
    metrics.record(Anomaly::ImputedCell, filled);

    table.map_column("team_abbreviation", |v| match v {
        Value::Str(s) => Value::Str(abbrev::canonicalize(s)),
        other => other.clone(),
    })?;
    let stats = codes.apply(&mut table, "team_abbreviation")?;
    metrics.record(Anomaly::NormalizedAbbreviation, stats.rewritten);

    let known: BTreeSet<String> = teams
        .column("team_abbreviation")?
        .into_iter()
        .filter_map(Value::key)
        .collect();
    let unmapped: BTreeSet<String> = table
        .column("team_abbreviation")?
        .into_iter()
        .filter_map(Value::key)
        .filter(|code| !known.contains(code))
        .collect();
    if !unmapped.is_empty() {
        tracing::warn!(codes = ?unmapped, "team codes with no current team");
    }
    metrics.record(Anomaly::UnmappedAbbreviation, unmapped.len());

    let table = table.drop_columns(&["team_id", "team_name"]);
    let identity = teams.select(&["team_id", "team_name", "team_abbreviation"])?;
    let joined = left_join(&table, &identity, "team_abbreviation", &["team_id", "team_name"])?;
    metrics.record(Anomaly::JoinMiss, joined.misses);
    if joined.fan_out > 0 {
        tracing::warn!(extra_rows = joined.fan_out, "duplicate team codes multiplied season rows");
    }

    Ok(Cleaned::new(joined.table, metrics))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn teams() -> Table {
        Table::from_rows(
            "team",
            ["team_id", "team_name", "team_abbreviation", "year_founded"],
            vec![
                vec![Value::Int(1), "Los Angeles Lakers".into(), "LAL".into(), Value::Int(1948)],
                vec![Value::Int(2), "Oklahoma City Thunder".into(), "OKC".into(), Value::Int(1967)],
            ],
        )
    }

    fn raw() -> Table {
        Table::from_rows(
            "all_seasons",
            ["Unnamed: 0", "player_name", "team_id", "team_abbreviation", "college", "season"],
            vec![
                vec!["0".into(), "A".into(), "99".into(), " sea".into(), Value::Null, "2001-02".into()],
                vec!["1".into(), "B".into(), "98".into(), "lal ".into(), "UCLA".into(), "2001-02".into()],
                vec!["2".into(), "C".into(), "97".into(), "XYZ".into(), "Duke".into(), "2001-02".into()],
            ],
        )
    }

    #[test]
    fn normalizes_then_joins() {
        let out = clean_all_seasons(&raw(), &teams(), AbbreviationMap::historical()).unwrap();
        let t = &out.table;
        assert_eq!(
            t.columns(),
            ["player_name", "team_abbreviation", "college", "season", "team_id", "team_name"]
        );
        assert_eq!(t.get(0, "team_abbreviation"), Some(&Value::from("OKC")));
        assert_eq!(t.get(0, "team_id"), Some(&Value::Int(2)));
        assert_eq!(t.get(0, "college"), Some(&Value::from(NO_COLLEGE)));
        assert_eq!(t.get(1, "team_name"), Some(&Value::from("Los Angeles Lakers")));
        assert_eq!(t.get(2, "team_id"), Some(&Value::Null));
        assert_eq!(out.metrics.count(Anomaly::NormalizedAbbreviation), 1);
        assert_eq!(out.metrics.count(Anomaly::UnmappedAbbreviation), 1);
        assert_eq!(out.metrics.count(Anomaly::JoinMiss), 1);
    }

    #[test]
    fn dependency_must_be_present() {
        let err = AllSeasonsCleaner.clean(&raw(), &Upstream::new()).unwrap_err();
        assert_eq!(err.kind(), "dependency_failed");
    }
}
