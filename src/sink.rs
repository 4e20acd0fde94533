//! Destinations for cleaned tables.
//!
//! A run hands every cleaned table to every configured [`Sink`]. Sinks are
//! independent: one failing for one table never stops the others, and the
//! pipeline records each outcome separately.
//!
//! - [`LocalFileSink`]: `<dir>/<table>_cleaned.csv`
//! - [`ObjectStoreSink`]: `<bucket>/<prefix>/<table>_cleaned.csv` through an [`ObjectIO`]
//! - [`WarehouseSink`]: truncate-and-load into `<project>.<dataset>.<table>` through a [`WarehouseIO`]

use crate::catalog::TableKind;
use crate::error::{EtlError, Result};
use crate::io::cloud::{
    DatasetSpec, ErrorKind, ObjectIO, RetryConfig, WarehouseIO, WriteDisposition, object_key,
    retry_with_backoff,
};
use crate::io::csv::{table_to_csv_bytes, write_table};
use crate::schema;
use crate::table::Table;
use crate::validation::format_errors;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// Where a table landed and how many rows it carried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivery {
    pub destination: String,
    pub rows: usize,
}

pub trait Sink: Send + Sync {
    /// Label used in logs and the run report.
    fn name(&self) -> &str;

    /// Persist `table` as the output for `kind`.
    ///
    /// # Errors
    /// Any failure is reported as [`EtlError::SinkFailure`] (or the IO error
    /// that caused it) and is local to this table and this sink.
    fn write(&self, kind: TableKind, table: &Table) -> Result<Delivery>;
}

// ============================================================================
// Local files
// ============================================================================

#[derive(Debug, Clone)]
pub struct LocalFileSink {
    dir: PathBuf,
}

impl LocalFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Sink for LocalFileSink {
    fn name(&self) -> &str {
        "local"
    }

    fn write(&self, kind: TableKind, table: &Table) -> Result<Delivery> {
        let path = self.dir.join(kind.file_name());
        let rows = write_table(&path, table)?;
        Ok(Delivery {
            destination: path.display().to_string(),
            rows,
        })
    }
}

// ============================================================================
// Object storage
// ============================================================================

#[derive(Clone)]
pub struct ObjectStoreSink {
    store: Arc<dyn ObjectIO>,
    bucket: String,
    prefix: String,
    retry: RetryConfig,
}

impl ObjectStoreSink {
    pub fn new(
        store: Arc<dyn ObjectIO>,
        bucket: impl Into<String>,
        prefix: impl Into<String>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            prefix: prefix.into(),
            retry,
        }
    }
}

impl Sink for ObjectStoreSink {
    fn name(&self) -> &str {
        "object_store"
    }

    fn write(&self, kind: TableKind, table: &Table) -> Result<Delivery> {
        let fail = |msg: String| EtlError::sink(self.name(), kind.name(), msg);
        let bytes = table_to_csv_bytes(table).map_err(|e| fail(e.to_string()))?;
        let key = object_key(&self.prefix, &kind.file_name());
        retry_with_backoff(&self.retry, || {
            self.store
                .put_object(&self.bucket, &key, &bytes, CSV_CONTENT_TYPE)
        })
        .map_err(|e| fail(e.to_string()))?;
        Ok(Delivery {
            destination: format!("{}://{}/{key}", self.store.provider(), self.bucket),
            rows: table.len(),
        })
    }
}

// ============================================================================
// Warehouse
// ============================================================================

#[derive(Clone)]
pub struct WarehouseSink {
    warehouse: Arc<dyn WarehouseIO>,
    dataset: DatasetSpec,
    retry: RetryConfig,
}

impl WarehouseSink {
    pub fn new(warehouse: Arc<dyn WarehouseIO>, dataset: DatasetSpec, retry: RetryConfig) -> Self {
        Self {
            warehouse,
            dataset,
            retry,
        }
    }

    fn ensure_dataset(&self) -> crate::io::cloud::CloudResult<()> {
        if retry_with_backoff(&self.retry, || self.warehouse.dataset_exists(&self.dataset))? {
            return Ok(());
        }
        match retry_with_backoff(&self.retry, || self.warehouse.create_dataset(&self.dataset)) {
            Ok(()) => {
                tracing::info!(dataset = %self.dataset.qualified(), location = %self.dataset.location, "created dataset");
                Ok(())
            }
            // lost a race with another writer
            Err(e) if e.kind == ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl Sink for WarehouseSink {
    fn name(&self) -> &str {
        "warehouse"
    }

    fn write(&self, kind: TableKind, table: &Table) -> Result<Delivery> {
        let fail = |msg: String| EtlError::sink(self.name(), kind.name(), msg);
        let declared = kind.schema();
        let prepared = schema::prepare_for_load(table, &declared);
        schema::validate(&prepared, &declared).map_err(|errs| fail(format_errors(&errs)))?;

        self.ensure_dataset().map_err(|e| fail(e.to_string()))?;

        let fields = schema::effective_schema(&prepared, &declared);
        let bytes = table_to_csv_bytes(&prepared).map_err(|e| fail(e.to_string()))?;
        let table_id = self.dataset.table_id(kind.warehouse_table());
        let loaded = retry_with_backoff(&self.retry, || {
            self.warehouse
                .load_csv(&table_id, &fields, &bytes, WriteDisposition::Truncate)
        })
        .map_err(|e| fail(e.to_string()))?;
        tracing::debug!(table = %table_id, rows = loaded, "warehouse load complete");
        Ok(Delivery {
            destination: format!("{}:{table_id}", self.warehouse.provider()),
            rows: usize::try_from(loaded).unwrap_or(usize::MAX),
        })
    }
}
