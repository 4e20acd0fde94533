use super::{Cleaned, Cleaner, Upstream, check_identifier, coerce_int_columns};
use crate::catalog::TableKind;
use crate::error::Result;
use crate::metrics::{Anomaly, TableMetrics};
use crate::table::Table;
use crate::validation::{format_errors, validators};
use std::collections::HashMap;

pub struct TeamCleaner;

impl Cleaner for TeamCleaner {
    fn kind(&self) -> TableKind {
        TableKind::Team
    }

    fn clean(&self, raw: &Table, _upstream: &Upstream<'_>) -> Result<Cleaned> {
        clean_team(raw)
    }
}

/// Rename identity columns and coerce `year_founded`.
///
/// Team codes are expected to be the current set only; a code on more than one
/// row would fan out the season join and is counted as
/// [`Anomaly::DuplicateTeamAbbreviation`].
///
/// # Errors
/// `SchemaMismatch` if `id`, `full_name` or `abbreviation` is missing.
pub fn clean_team(raw: &Table) -> Result<Cleaned> {
    let mut metrics = TableMetrics::new(raw.len());
    let mut table = raw.clone().rename(&[
        ("id", "team_id"),
        ("full_name", "team_name"),
        ("abbreviation", "team_abbreviation"),
    ])?;
    coerce_int_columns(&mut table, &["year_founded"], &mut metrics)?;
    check_identifier(&table, "team_id", &mut metrics)?;

    let mut seen: HashMap<String, usize> = HashMap::new();
    for code in table.column("team_abbreviation")?.into_iter().filter_map(|v| v.key()) {
        *seen.entry(code).or_default() += 1;
    }
    let mut duplicates: Vec<&str> = seen
        .iter()
        .filter(|(_, n)| **n > 1)
        .map(|(code, _)| code.as_str())
        .collect();
    if !duplicates.is_empty() {
        duplicates.sort_unstable();
        tracing::warn!(codes = ?duplicates, "team abbreviation appears on more than one row");
        metrics.record(Anomaly::DuplicateTeamAbbreviation, duplicates.len());
    }

    if let Err(errors) = validators::abbreviation_format(&table, "team_abbreviation") {
        tracing::warn!(errors = %format_errors(&errors), "unexpected team code format");
    }

    Ok(Cleaned::new(table, metrics))
}
