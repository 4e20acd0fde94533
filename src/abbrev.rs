//! Historical team-code normalization.
//!
//! Relocated and renamed franchises appear under retired codes in older
//! seasons. Joins on team code only work once those are rewritten to the
//! franchise's current code. The map is static and shared by every caller.

use crate::error::Result;
use crate::table::{Table, Value};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Retired code -> current code.
pub const HISTORICAL_CODES: &[(&str, &str)] = &[
    ("VAN", "MEM"), // Vancouver Grizzlies
    ("CHH", "CHA"), // Charlotte Hornets (1988-2002)
    ("SEA", "OKC"), // Seattle SuperSonics
    ("NJN", "BKN"), // New Jersey Nets
    ("NOH", "NOP"), // New Orleans Hornets
    ("NOK", "NOP"), // New Orleans/Oklahoma City Hornets
    ("CHO", "CHA"),
];

static HISTORICAL: LazyLock<AbbreviationMap> =
    LazyLock::new(|| AbbreviationMap::from_pairs(HISTORICAL_CODES.iter().copied()));

/// Counts from one application of the map to a table column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    /// Cells rewritten from a retired code.
    pub rewritten: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbbreviationMap {
    map: HashMap<String, String>,
}

impl AbbreviationMap {
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            map: pairs
                .into_iter()
                .map(|(old, new)| (old.to_string(), new.to_string()))
                .collect(),
        }
    }

    /// The process-wide historical map.
    #[must_use]
    pub fn historical() -> &'static Self {
        &HISTORICAL
    }

    /// Current code for `code`; unknown codes pass through unchanged.
    #[must_use]
    pub fn normalize<'a>(&'a self, code: &'a str) -> &'a str {
        self.map.get(code).map_or(code, String::as_str)
    }

    /// `true` if no target code is itself a retired code, so applying the
    /// map twice gives the same result as once.
    #[must_use]
    pub fn is_idempotent(&self) -> bool {
        self.map.values().all(|v| !self.map.contains_key(v))
    }

    /// Rewrite `column` of `table` in place. Null cells are left alone.
    pub fn apply(&self, table: &mut Table, column: &str) -> Result<NormalizeStats> {
        let mut stats = NormalizeStats::default();
        table.map_column(column, |v| match v {
            Value::Str(code) => match self.map.get(code) {
                Some(current) => {
                    stats.rewritten += 1;
                    Value::Str(current.clone())
                }
                None => v.clone(),
            },
            other => other.clone(),
        })?;
        Ok(stats)
    }
}

/// Trim surrounding whitespace and upper-case a raw team code.
#[must_use]
pub fn canonicalize(raw: &str) -> String {
    raw.trim().to_uppercase()
}
