//! One cleaner per output table.
//!
//! A cleaner takes a raw table (and, for dependent tables, the cleaned tables
//! it joins against) and returns a new cleaned table plus the anomaly counters
//! for what it dropped or filled. Cleaners never mutate their input and never
//! touch the filesystem.
//!
//! | table | depends on |
//! |-------|------------|
//! | [`player`] | |
//! | [`team`] | |
//! | [`game`] | |
//! | [`line_score`] | |
//! | [`all_seasons`] | `team` |

pub mod all_seasons;
pub mod game;
pub mod line_score;
pub mod player;
pub mod team;

use crate::catalog::TableKind;
use crate::error::{EtlError, Result};
use crate::metrics::{Anomaly, TableMetrics};
use crate::table::{Table, Value};
use crate::validation::{combine_validations, format_errors, validators};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;

/// A cleaned table and the counters gathered while producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Cleaned {
    pub table: Table,
    pub metrics: TableMetrics,
}

impl Cleaned {
    pub(crate) fn new(table: Table, mut metrics: TableMetrics) -> Self {
        metrics.rows_out = table.len();
        Self { table, metrics }
    }
}

/// Cleaned tables made available to dependent cleaners.
#[derive(Debug, Default)]
pub struct Upstream<'a> {
    tables: BTreeMap<TableKind, &'a Table>,
}

impl<'a> Upstream<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, kind: TableKind, table: &'a Table) -> Self {
        self.tables.insert(kind, table);
        self
    }

    pub fn insert(&mut self, kind: TableKind, table: &'a Table) {
        self.tables.insert(kind, table);
    }

    /// The cleaned `dependency` needed by `table`.
    ///
    /// # Errors
    /// [`EtlError::DependencyFailed`] if `dependency` did not produce output.
    pub fn get(&self, table: TableKind, dependency: TableKind) -> Result<&'a Table> {
        self.tables
            .get(&dependency)
            .copied()
            .ok_or_else(|| EtlError::DependencyFailed {
                table: table.name().to_string(),
                dependency: dependency.name().to_string(),
            })
    }
}

/// A table cleaner.
pub trait Cleaner: Send + Sync {
    fn kind(&self) -> TableKind;

    /// Tables whose cleaned output must exist before this cleaner runs.
    fn dependencies(&self) -> &'static [TableKind] {
        &[]
    }

    /// # Errors
    /// Fails on a missing expected column or a missing dependency.
    fn clean(&self, raw: &Table, upstream: &Upstream<'_>) -> Result<Cleaned>;
}

/// The cleaner for `kind`.
#[must_use]
pub fn cleaner_for(kind: TableKind) -> &'static dyn Cleaner {
    match kind {
        TableKind::Player => &player::PlayerCleaner,
        TableKind::Team => &team::TeamCleaner,
        TableKind::Game => &game::GameCleaner,
        TableKind::LineScore => &line_score::LineScoreCleaner,
        TableKind::AllSeasons => &all_seasons::AllSeasonsCleaner,
    }
}

// ============================================================================
// Shared steps
// ============================================================================

/// First day of the 1996-97 season. Games before it are dropped.
#[must_use]
pub fn date_floor() -> NaiveDate {
    NaiveDate::from_ymd_opt(1996, 10, 1).unwrap_or(NaiveDate::MIN)
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parse a raw date, with or without a time of day.
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
                .map(|dt| dt.date())
        })
}

/// Convert `column` to dates in place. Unparsable text becomes null and is
/// counted as [`Anomaly::UnparsableDate`].
pub(crate) fn parse_date_column(
    table: &mut Table,
    column: &str,
    metrics: &mut TableMetrics,
) -> Result<()> {
    let mut unparsable = 0;
    table.map_column(column, |v| match v {
        Value::Str(s) => parse_date(s).map_or_else(
            || {
                unparsable += 1;
                Value::Null
            },
            Value::Date,
        ),
        other => other.clone(),
    })?;
    metrics.record(Anomaly::UnparsableDate, unparsable);
    Ok(())
}

/// Keep rows whose `column` date is on or after [`date_floor`]. Null dates are dropped.
pub(crate) fn apply_date_floor(
    table: &mut Table,
    column: &str,
    metrics: &mut TableMetrics,
) -> Result<()> {
    let idx = table.require(column)?;
    let floor = date_floor();
    let dropped = table.retain_rows(|r| r[idx].as_date().is_some_and(|d| d >= floor));
    metrics.record(Anomaly::BeforeDateFloor, dropped);
    Ok(())
}

/// Drop repeats on `keys`, first occurrence wins.
pub(crate) fn dedup(table: &mut Table, keys: &[&str], metrics: &mut TableMetrics) -> Result<()> {
    let removed = table.dedup_by(keys)?;
    metrics.record(Anomaly::DuplicateRow, removed);
    Ok(())
}

/// Warn when `column` is not a unique, non-null key. Each failed check is
/// counted once as [`Anomaly::InvalidIdentifier`]; rows are kept.
pub(crate) fn check_identifier(table: &Table, column: &str, metrics: &mut TableMetrics) -> Result<()> {
    table.require(column)?;
    let checks = combine_validations(vec![
        validators::not_null(table, column),
        validators::unique(table, column),
    ]);
    if let Err(errors) = checks {
        tracing::warn!(
            table = table.name(),
            column,
            errors = %format_errors(&errors),
            "identifier column is not a unique key"
        );
        metrics.record(Anomaly::InvalidIdentifier, errors.len());
    }
    Ok(())
}

/// Coerce each present column to integer. Missing or unparsable cells become 0
/// and are counted as imputed. Columns the table does not have are skipped.
pub(crate) fn coerce_int_columns(
    table: &mut Table,
    columns: &[&str],
    metrics: &mut TableMetrics,
) -> Result<()> {
    for &column in columns {
        if !table.has_column(column) {
            continue;
        }
        let mut filled = 0;
        table.map_column(column, |v| {
            v.to_i64().map_or_else(
                || {
                    filled += 1;
                    Value::Int(0)
                },
                Value::Int,
            )
        })?;
        metrics.record(Anomaly::ImputedCell, filled);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_formats() {
        let d = NaiveDate::from_ymd_opt(1996, 10, 1).unwrap();
        assert_eq!(parse_date("1996-10-01"), Some(d));
        assert_eq!(parse_date("1996-10-01 00:00:00"), Some(d));
        assert_eq!(parse_date("1996-10-01T00:00:00"), Some(d));
        assert_eq!(parse_date("10/01/1996"), Some(d));
        assert_eq!(parse_date("not a date"), None);
    }

    #[test]
    fn date_floor_is_inclusive() {
        let mut t = Table::from_rows(
            "game",
            ["game_date"],
            vec![
                vec!["1996-10-01".into()],
                vec!["1996-09-30".into()],
                vec!["garbage".into()],
                vec![Value::Null],
            ],
        );
        let mut m = TableMetrics::new(t.len());
        parse_date_column(&mut t, "game_date", &mut m).unwrap();
        apply_date_floor(&mut t, "game_date", &mut m).unwrap();
        assert_eq!(t.len(), 1);
        assert_eq!(m.count(Anomaly::UnparsableDate), 1);
        assert_eq!(m.count(Anomaly::BeforeDateFloor), 3);
    }

    #[test]
    fn int_coercion_truncates_and_fills() {
        let mut t = Table::from_rows(
            "g",
            ["pts"],
            vec![vec!["101.0".into()], vec![Value::Null], vec!["-3.7".into()]],
        );
        let mut m = TableMetrics::default();
        coerce_int_columns(&mut t, &["pts", "absent"], &mut m).unwrap();
        let pts: Vec<_> = t.column("pts").unwrap().into_iter().cloned().collect();
        assert_eq!(pts, [Value::Int(101), Value::Int(0), Value::Int(-3)]);
        assert_eq!(m.count(Anomaly::ImputedCell), 1);
    }

    #[test]
    fn identifier_checks_count_each_failure() {
        let t = Table::from_rows(
            "team",
            ["team_id"],
            vec![vec!["1".into()], vec!["1".into()], vec![Value::Null]],
        );
        let mut m = TableMetrics::new(t.len());
        check_identifier(&t, "team_id", &mut m).unwrap();
        assert_eq!(m.count(Anomaly::InvalidIdentifier), 2);

        let clean = Table::from_rows("team", ["team_id"], vec![vec!["1".into()], vec!["2".into()]]);
        let mut m = TableMetrics::new(clean.len());
        check_identifier(&clean, "team_id", &mut m).unwrap();
        assert_eq!(m.count(Anomaly::InvalidIdentifier), 0);
    }

    #[test]
    fn missing_dependency_is_reported() {
        let up = Upstream::new();
        let err = up.get(TableKind::AllSeasons, TableKind::Team).unwrap_err();
        assert!(matches!(err, EtlError::DependencyFailed { .. }));
    }
}
