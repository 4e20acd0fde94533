//! Error taxonomy for a pipeline run.
//!
//! Every variant is local to one table (cleaning) or one destination (sinks).
//! Data-quality anomalies such as unparsable dates or join misses are *not*
//! errors; they are counted in [`crate::metrics::TableMetrics`] instead.

use crate::io::cloud::CloudIOError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EtlError {
    /// A raw source file was not on disk when its cleaner ran.
    #[error("source file for `{table}` not found at {}", path.display())]
    MissingSourceFile { table: String, path: PathBuf },

    /// A cleaner expected a column the raw table does not have.
    #[error("table `{table}` is missing expected column `{column}`")]
    SchemaMismatch { table: String, column: String },

    /// An operation would produce two columns with the same name.
    #[error("table `{table}` already has a column named `{column}`")]
    ColumnConflict { table: String, column: String },

    /// A dependent cleaner could not run because its upstream table failed.
    #[error("table `{table}` depends on `{dependency}`, which failed")]
    DependencyFailed { table: String, dependency: String },

    /// Fetching a dataset from the external catalog failed.
    #[error("acquisition of `{dataset}` failed: {source}")]
    AcquisitionFailure {
        dataset: String,
        #[source]
        source: CloudIOError,
    },

    /// Writing a cleaned table to one destination failed.
    #[error("sink `{sink}` failed for `{table}`: {message}")]
    SinkFailure {
        sink: String,
        table: String,
        message: String,
    },

    #[error("csv error on {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EtlError {
    pub fn schema(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn sink(sink: impl Into<String>, table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkFailure {
            sink: sink.into(),
            table: table.into(),
            message: message.into(),
        }
    }

    /// Short machine-readable name of the error class, used in run reports.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingSourceFile { .. } => "missing_source_file",
            Self::SchemaMismatch { .. } => "schema_mismatch",
            Self::ColumnConflict { .. } => "column_conflict",
            Self::DependencyFailed { .. } => "dependency_failed",
            Self::AcquisitionFailure { .. } => "acquisition_failure",
            Self::SinkFailure { .. } => "sink_failure",
            Self::Csv { .. } => "csv",
            Self::Io { .. } => "io",
        }
    }
}

pub type Result<T, E = EtlError> = std::result::Result<T, E>;
