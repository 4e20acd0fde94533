//! Warehouse schemas for the five output tables, and the typed preparation
//! applied to a cleaned table right before it is loaded.

use crate::table::{Table, Value};
use crate::validation::{ValidationError, ValidationResult, combine_validations, validators};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    Integer,
    Float,
    String,
    Date,
    Boolean,
}

impl FieldType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Float => "FLOAT",
            Self::String => "STRING",
            Self::Date => "DATE",
            Self::Boolean => "BOOLEAN",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldMode {
    Required,
    Nullable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    pub field_type: FieldType,
    pub mode: FieldMode,
}

impl SchemaField {
    pub fn new(name: impl Into<String>, field_type: FieldType, mode: FieldMode) -> Self {
        Self {
            name: name.into(),
            field_type,
            mode,
        }
    }

    #[must_use]
    pub fn is_required(&self) -> bool {
        self.mode == FieldMode::Required
    }
}

use FieldMode::{Nullable as N, Required as R};
use FieldType::{Boolean as B, Date as D, Float as F, Integer as I, String as S};

type FieldDef = (&'static str, FieldType, FieldMode);

const PLAYERS: &[FieldDef] = &[
    ("player_id", I, R),
    ("player_name", S, R),
    ("first_name", S, N),
    ("last_name", S, N),
    ("is_active", B, N),
];

const TEAMS: &[FieldDef] = &[
    ("team_id", I, R),
    ("team_name", S, R),
    ("team_abbreviation", S, R),
    ("nickname", S, N),
    ("city", S, N),
    ("state", S, N),
    ("year_founded", I, N),
];

const GAMES: &[FieldDef] = &[
    ("season_id", I, R),
    ("game_id", I, R),
    ("game_date", D, R),
    ("season_type", S, N),
    ("team_id", I, R),
    ("team_side", S, R),
    ("matchup", S, N),
    ("wl", S, N),
    ("min", I, N),
    ("fgm", I, N),
    ("fga", I, N),
    ("fg_pct", F, N),
    ("fg3m", I, N),
    ("fg3a", I, N),
    ("fg3_pct", F, N),
    ("ftm", I, N),
    ("fta", I, N),
    ("ft_pct", F, N),
    ("oreb", I, N),
    ("dreb", I, N),
    ("reb", I, N),
    ("ast", I, N),
    ("stl", I, N),
    ("blk", I, N),
    ("tov", I, N),
    ("pf", I, N),
    ("pts", I, N),
    ("plus_minus", I, N),
];

const LINE_SCORE: &[FieldDef] = &[
    ("game_date", D, R),
    ("game_id", I, R),
    ("team_id", I, R),
    ("team_abbreviation", S, N),
    ("team_city_name", S, N),
    ("team_nickname", S, N),
    ("team_wins_losses", S, N),
    ("pts_qtr1", I, N),
    ("pts_qtr2", I, N),
    ("pts_qtr3", I, N),
    ("pts_qtr4", I, N),
    ("pts_ot1", I, N),
    ("pts_ot2", I, N),
    ("pts_ot3", I, N),
    ("pts_ot4", I, N),
    ("pts_ot5", I, N),
    ("pts_ot6", I, N),
    ("pts_ot7", I, N),
    ("pts_ot8", I, N),
    ("pts_ot9", I, N),
    ("pts_ot10", I, N),
    ("pts", I, N),
    ("local_visitante", S, R),
];

const ALL_SEASONS: &[FieldDef] = &[
    ("player_name", S, R),
    ("team_abbreviation", S, R),
    ("age", F, N),
    ("player_height", F, N),
    ("player_weight", F, N),
    ("college", S, N),
    ("country", S, N),
    ("draft_year", S, N),
    ("draft_round", S, N),
    ("draft_number", S, N),
    ("gp", F, N),
    ("pts", F, N),
    ("reb", F, N),
    ("ast", F, N),
    ("net_rating", F, N),
    ("oreb_pct", F, N),
    ("dreb_pct", F, N),
    ("usg_pct", F, N),
    ("ts_pct", F, N),
    ("ast_pct", F, N),
    ("season", S, N),
    ("team_id", I, N),
    ("team_name", S, N),
];

fn build(defs: &[FieldDef]) -> Vec<SchemaField> {
    defs.iter()
        .map(|&(name, t, m)| SchemaField::new(name, t, m))
        .collect()
}

#[must_use]
pub fn players() -> Vec<SchemaField> {
    build(PLAYERS)
}

#[must_use]
pub fn teams() -> Vec<SchemaField> {
    build(TEAMS)
}

#[must_use]
pub fn games() -> Vec<SchemaField> {
    build(GAMES)
}

#[must_use]
pub fn line_score() -> Vec<SchemaField> {
    build(LINE_SCORE)
}

#[must_use]
pub fn all_seasons() -> Vec<SchemaField> {
    build(ALL_SEASONS)
}

/// The schema to load `table` with: declared fields for the columns the table
/// actually has, in table order, and nullable strings for undeclared columns.
#[must_use]
pub fn effective_schema(table: &Table, declared: &[SchemaField]) -> Vec<SchemaField> {
    table
        .columns()
        .iter()
        .map(|c| {
            declared
                .iter()
                .find(|f| &f.name == c)
                .cloned()
                .unwrap_or_else(|| SchemaField::new(c.clone(), FieldType::String, FieldMode::Nullable))
        })
        .collect()
}

/// Check `table` against `declared`: required columns exist and hold no nulls,
/// integer columns parse as integers.
pub fn validate(table: &Table, declared: &[SchemaField]) -> ValidationResult {
    let mut results = Vec::new();
    for field in declared {
        if !table.has_column(&field.name) {
            if field.is_required() {
                results.push(Err(vec![
                    ValidationError::field(&field.name, "required column is missing")
                        .with_code("missing_column"),
                ]));
            }
            continue;
        }
        if field.is_required() {
            results.push(validators::not_null(table, &field.name));
        }
        if field.field_type == FieldType::Integer {
            results.push(validators::integer(table, &field.name));
        }
    }
    combine_validations(results)
}

/// A copy of `table` with every declared integer column converted to
/// [`Value::Int`]. Missing or unparsable cells become 0.
#[must_use]
pub fn prepare_for_load(table: &Table, declared: &[SchemaField]) -> Table {
    let mut out = table.clone();
    for field in declared
        .iter()
        .filter(|f| f.field_type == FieldType::Integer && table.has_column(&f.name))
    {
        // Column presence checked above.
        let _ = out.map_column(&field.name, |v| Value::Int(v.to_i64().unwrap_or(0)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_schema_declares_unique_fields() {
        for schema in [players(), teams(), games(), line_score(), all_seasons()] {
            let mut names: Vec<_> = schema.iter().map(|f| f.name.as_str()).collect();
            let before = names.len();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), before);
        }
    }

    #[test]
    fn effective_schema_defaults_unknown_columns_to_nullable_string() {
        let t = Table::new("teams", ["team_id", "mascot"]);
        let eff = effective_schema(&t, &teams());
        assert_eq!(eff[0].field_type, FieldType::Integer);
        assert_eq!(eff[1], SchemaField::new("mascot", FieldType::String, FieldMode::Nullable));
    }

    #[test]
    fn validate_flags_nulls_in_required_columns() {
        let t = Table::from_rows(
            "players",
            ["player_id", "player_name"],
            vec![vec![Value::Int(1), Value::Null]],
        );
        let errs = validate(&t, &players()).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].field.as_deref(), Some("player_name"));
    }

    #[test]
    fn prepare_for_load_zero_fills_integer_columns() {
        let t = Table::from_rows(
            "all_seasons",
            ["player_name", "team_abbreviation", "team_id"],
            vec![
                vec!["A".into(), "LAL".into(), "1610612747".into()],
                vec!["B".into(), "MEM".into(), Value::Null],
            ],
        );
        let out = prepare_for_load(&t, &all_seasons());
        assert_eq!(out.get(0, "team_id"), Some(&Value::Int(1_610_612_747)));
        assert_eq!(out.get(1, "team_id"), Some(&Value::Int(0)));
        assert_eq!(out.get(1, "player_name"), Some(&Value::from("B")));
    }
}
