//! In-memory relations: an ordered list of rows over named, dynamically typed columns.
//!
//! A [`Table`] is what every stage of the pipeline consumes and produces. Raw
//! sources load with every non-missing field as [`Value::Str`]; cleaners coerce
//! the columns they care about and leave the rest as delivered.
//!
//! All reshaping operations take `self` by value or `&self` and return a new
//! table, so a raw snapshot handed to a cleaner is never mutated in place.

use crate::error::{EtlError, Result};
use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;

/// Field spellings treated as a missing value when reading raw text.
///
/// Mirrors the conventional NA markers used by the upstream datasets' tooling.
pub const NA_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// A single cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Str(String),
    Date(NaiveDate),
}

impl Value {
    /// Interpret a raw CSV field, mapping NA markers to [`Value::Null`].
    #[must_use]
    pub fn from_raw(field: &str) -> Self {
        if NA_MARKERS.contains(&field) {
            Self::Null
        } else {
            Self::Str(field.to_string())
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view of the cell; text is parsed, dates and nulls have none.
    #[must_use]
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) if f.is_finite() => Some(*f),
            Self::Str(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            _ => None,
        }
    }

    /// Integer view of the cell. Fractional numbers truncate toward zero.
    #[must_use]
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Str(s) => match s.trim().parse::<i64>() {
                Ok(i) => Some(i),
                Err(_) => Self::Float(s.trim().parse::<f64>().ok()?).to_i64(),
            },
            #[allow(clippy::cast_possible_truncation)]
            Self::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Hashable rendering used for grouping, deduplication and join keys.
    ///
    /// `None` for nulls so that missing values never collide with real text.
    #[must_use]
    pub fn key(&self) -> Option<String> {
        match self {
            Self::Null => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(x) => serializer.serialize_f64(*x),
            Self::Str(s) => serializer.serialize_str(s),
            Self::Date(_) => serializer.collect_str(self),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// A named relation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// An empty table with the given header.
    pub fn new<S: Into<String>>(name: impl Into<String>, columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Build a table from a header and rows. Short rows are padded with nulls
    /// and long rows are truncated to the header width.
    pub fn from_rows<S: Into<String>>(
        name: impl Into<String>,
        columns: impl IntoIterator<Item = S>,
        rows: Vec<Vec<Value>>,
    ) -> Self {
        let mut t = Self::new(name, columns);
        for row in rows {
            t.push_row(row);
        }
        t
    }

    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    /// Index of `column`, or [`EtlError::SchemaMismatch`] naming this table.
    pub fn require(&self, column: &str) -> Result<usize> {
        self.column_index(column)
            .ok_or_else(|| EtlError::schema(&self.name, column))
    }

    /// Cell at `row` in `column`, if both exist.
    #[must_use]
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// All cells of one column, top to bottom.
    pub fn column(&self, column: &str) -> Result<Vec<&Value>> {
        let idx = self.require(column)?;
        Ok(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Rename columns; every `from` must exist.
    pub fn rename(mut self, pairs: &[(&str, &str)]) -> Result<Self> {
        for (from, to) in pairs {
            let idx = self.require(from)?;
            if from != to && self.has_column(to) {
                return Err(EtlError::ColumnConflict {
                    table: self.name.clone(),
                    column: (*to).to_string(),
                });
            }
            self.columns[idx] = (*to).to_string();
        }
        Ok(self)
    }

    /// Project onto `columns` in the given order.
    pub fn select(&self, columns: &[&str]) -> Result<Self> {
        let idx = columns
            .iter()
            .map(|c| self.require(c))
            .collect::<Result<Vec<_>>>()?;
        let rows = self
            .rows
            .iter()
            .map(|r| idx.iter().map(|&i| r[i].clone()).collect())
            .collect();
        Ok(Self {
            name: self.name.clone(),
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
            rows,
        })
    }

    /// Remove the named columns. Names that are not present are ignored.
    #[must_use]
    pub fn drop_columns(mut self, columns: &[&str]) -> Self {
        let keep: Vec<bool> = self
            .columns
            .iter()
            .map(|c| !columns.contains(&c.as_str()))
            .collect();
        if keep.iter().all(|k| *k) {
            return self;
        }
        self.columns = retain_by_mask(std::mem::take(&mut self.columns), &keep);
        self.rows = std::mem::take(&mut self.rows)
            .into_iter()
            .map(|r| retain_by_mask(r, &keep))
            .collect();
        self
    }

    /// Replace every cell of `column` with `f(cell)`.
    pub fn map_column<F>(&mut self, column: &str, mut f: F) -> Result<()>
    where
        F: FnMut(&Value) -> Value,
    {
        let idx = self.require(column)?;
        for row in &mut self.rows {
            row[idx] = f(&row[idx]);
        }
        Ok(())
    }

    /// Replace null cells of `column` with `value`; returns how many were filled.
    pub fn fill_nulls(&mut self, column: &str, value: &Value) -> Result<usize> {
        let idx = self.require(column)?;
        let mut filled = 0;
        for row in &mut self.rows {
            if row[idx].is_null() {
                row[idx] = value.clone();
                filled += 1;
            }
        }
        Ok(filled)
    }

    /// Keep rows for which `keep` returns `true`; returns how many were removed.
    pub fn retain_rows<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&[Value]) -> bool,
    {
        let before = self.rows.len();
        self.rows.retain(|r| keep(r));
        before - self.rows.len()
    }

    /// Drop rows whose values on `keys` repeat an earlier row. The first
    /// occurrence in the current order wins. Nulls compare equal to nulls.
    ///
    /// Returns how many rows were removed.
    pub fn dedup_by(&mut self, keys: &[&str]) -> Result<usize> {
        let idx = keys
            .iter()
            .map(|k| self.require(k))
            .collect::<Result<Vec<_>>>()?;
        let mut seen: HashSet<Vec<Option<String>>> = HashSet::with_capacity(self.rows.len());
        Ok(self.retain_rows(|r| seen.insert(idx.iter().map(|&i| r[i].key()).collect())))
    }

    /// Stack `other` underneath `self`. Both must have the same header.
    pub fn concat(mut self, other: Self) -> Result<Self> {
        if self.columns != other.columns {
            let column = other
                .columns
                .iter()
                .find(|c| !self.columns.contains(c))
                .or_else(|| self.columns.iter().find(|c| !other.columns.contains(c)))
                .cloned()
                .unwrap_or_default();
            return Err(EtlError::schema(&self.name, column));
        }
        self.rows.extend(other.rows);
        Ok(self)
    }

    /// Count of null cells in `column`.
    pub fn null_count(&self, column: &str) -> Result<usize> {
        let idx = self.require(column)?;
        Ok(self.rows.iter().filter(|r| r[idx].is_null()).count())
    }
}

fn retain_by_mask<T>(items: Vec<T>, keep: &[bool]) -> Vec<T> {
    items
        .into_iter()
        .zip(keep)
        .filter_map(|(item, k)| k.then_some(item))
        .collect()
}
