use super::{Cleaned, Cleaner, Upstream, check_identifier};
use crate::catalog::TableKind;
use crate::error::Result;
use crate::metrics::TableMetrics;
use crate::table::Table;

pub struct PlayerCleaner;

impl Cleaner for PlayerCleaner {
    fn kind(&self) -> TableKind {
        TableKind::Player
    }

    fn clean(&self, raw: &Table, _upstream: &Upstream<'_>) -> Result<Cleaned> {
        clean_player(raw)
    }
}

/// Rename the identity columns; every other column passes through.
/// A null or repeated `player_id` is warned about and counted, not dropped.
///
/// # Errors
/// `SchemaMismatch` if `id` or `full_name` is missing.
pub fn clean_player(raw: &Table) -> Result<Cleaned> {
    let mut metrics = TableMetrics::new(raw.len());
    let table = raw
        .clone()
        .rename(&[("id", "player_id"), ("full_name", "player_name")])?;
    check_identifier(&table, "player_id", &mut metrics)?;
    Ok(Cleaned::new(table, metrics))
}
