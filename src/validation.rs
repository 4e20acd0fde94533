//! Data quality checks over cleaned tables.
//!
//! Checks never mutate a table. They return a [`ValidationResult`] listing
//! every problem found so callers can log the whole batch at once.
//!
//! # Example
//!
//! ```
//! use courtside::table::{Table, Value};
//! use courtside::validation::{combine_validations, validators};
//!
//! let teams = Table::from_rows(
//!     "team",
//!     ["team_id", "team_abbreviation"],
//!     vec![
//!         vec![Value::Int(1), "LAL".into()],
//!         vec![Value::Int(2), "lal".into()],
//!     ],
//! );
//!
//! let result = combine_validations(vec![
//!     validators::not_null(&teams, "team_id"),
//!     validators::abbreviation_format(&teams, "team_abbreviation"),
//! ]);
//! assert_eq!(result.unwrap_err().len(), 1);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for validation operations.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A single validation error with context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// The column that failed validation (optional)
    pub field: Option<String>,
    /// Human-readable error message
    pub message: String,
    /// Error code for categorization (optional)
    pub code: Option<String>,
}

impl ValidationError {
    /// Create a validation error for a specific column.
    pub fn field<S: Into<String>, M: Into<String>>(field: S, message: M) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
            code: None,
        }
    }

    /// Attach an error code.
    #[must_use]
    pub fn with_code<S: Into<String>>(mut self, code: S) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref field) = self.field {
            write!(f, "[{}] {}", field, self.message)?;
        } else {
            write!(f, "{}", self.message)?;
        }
        if let Some(ref code) = self.code {
            write!(f, " (code: {})", code)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Join a batch of errors into one line for logs and sink failure messages.
#[must_use]
pub fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub mod validators {
    use super::{ValidationError, ValidationResult};
    use crate::table::Table;
    use regex::Regex;
    use std::collections::HashMap;
    use std::sync::LazyLock;

    static ABBREVIATION: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^[A-Z]{2,3}$").expect("static pattern"));

    fn missing(table: &Table, column: &str) -> ValidationResult {
        Err(vec![
            ValidationError::field(column, format!("column missing from `{}`", table.name()))
                .with_code("missing_column"),
        ])
    }

    /// Every cell of `column` is non-null.
    pub fn not_null(table: &Table, column: &str) -> ValidationResult {
        let Ok(nulls) = table.null_count(column) else {
            return missing(table, column);
        };
        if nulls == 0 {
            Ok(())
        } else {
            Err(vec![
                ValidationError::field(column, format!("{nulls} null value(s) in a required column"))
                    .with_code("null"),
            ])
        }
    }

    /// No two non-null cells of `column` are equal.
    pub fn unique(table: &Table, column: &str) -> ValidationResult {
        let Ok(cells) = table.column(column) else {
            return missing(table, column);
        };
        let mut counts: HashMap<String, usize> = HashMap::new();
        for key in cells.into_iter().filter_map(|v| v.key()) {
            *counts.entry(key).or_default() += 1;
        }
        let mut dupes: Vec<String> = counts
            .into_iter()
            .filter(|(_, n)| *n > 1)
            .map(|(k, _)| k)
            .collect();
        if dupes.is_empty() {
            return Ok(());
        }
        dupes.sort();
        Err(vec![
            ValidationError::field(column, format!("duplicate value(s): {}", dupes.join(", ")))
                .with_code("duplicate"),
        ])
    }

    /// Every non-null cell of `column` parses as an integer.
    pub fn integer(table: &Table, column: &str) -> ValidationResult {
        let Ok(cells) = table.column(column) else {
            return missing(table, column);
        };
        let bad = cells
            .iter()
            .filter(|v| !v.is_null() && v.to_i64().is_none())
            .count();
        if bad == 0 {
            Ok(())
        } else {
            Err(vec![
                ValidationError::field(column, format!("{bad} value(s) are not integers"))
                    .with_code("type"),
            ])
        }
    }

    /// Every cell of `column` is a 2-3 letter upper-case team code.
    pub fn abbreviation_format(table: &Table, column: &str) -> ValidationResult {
        let Ok(cells) = table.column(column) else {
            return missing(table, column);
        };
        let mut bad: Vec<String> = cells
            .iter()
            .filter(|v| !v.as_str().is_some_and(|s| ABBREVIATION.is_match(s)))
            .map(ToString::to_string)
            .collect();
        if bad.is_empty() {
            return Ok(());
        }
        bad.sort();
        bad.dedup();
        Err(vec![
            ValidationError::field(column, format!("malformed team code(s): {:?}", bad))
                .with_code("format"),
        ])
    }
}

/// Merge several results, keeping every error.
pub fn combine_validations(results: Vec<ValidationResult>) -> ValidationResult {
    let mut all_errors = Vec::new();
    for result in results {
        if let Err(mut errors) = result {
            all_errors.append(&mut errors);
        }
    }
    if all_errors.is_empty() {
        Ok(())
    } else {
        Err(all_errors)
    }
}
