//! Core traits for the remote destinations and sources of a run.
//!
//! These interfaces are synchronous. Implementations backed by async SDKs are
//! expected to block internally, matching the batch execution model of the
//! pipeline.

use crate::schema::SchemaField;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::path::Path;

// ============================================================================
// Core Error Type
// ============================================================================

/// Generic error type for cloud IO operations
#[derive(Debug, Clone)]
pub struct CloudIOError {
    pub message: String,
    pub kind: ErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Authentication,
    Authorization,
    NotFound,
    AlreadyExists,
    InvalidInput,
    Network,
    Timeout,
    ServiceUnavailable,
    RateLimited,
    InternalError,
    Other,
}

impl ErrorKind {
    /// Whether an operation failing with this kind may succeed if retried.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(
            self,
            Self::Network | Self::Timeout | Self::ServiceUnavailable | Self::RateLimited
        )
    }
}

impl fmt::Display for CloudIOError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for CloudIOError {}

impl CloudIOError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }
}

pub type CloudResult<T> = Result<T, CloudIOError>;

// ============================================================================
// ObjectIO - Object Storage
// ============================================================================

/// Metadata for an object in storage
#[derive(Debug, Clone)]
pub struct ObjectMetadata {
    pub key: String,
    pub size: u64,
    pub content_type: Option<String>,
}

/// Trait for object storage operations
pub trait ObjectIO: Send + Sync {
    /// Short label used in logs and run reports (e.g. `"gcs"`).
    fn provider(&self) -> &str;

    /// Upload data, replacing any existing object at `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the bucket doesn't exist, permissions are not enough, or the upload fails
    fn put_object(&self, bucket: &str, key: &str, data: &[u8], content_type: &str)
    -> CloudResult<()>;

    /// Download data from object storage
    ///
    /// # Errors
    ///
    /// Returns an error if the object doesn't exist, permissions are not enough, or the download fails
    fn get_object(&self, bucket: &str, key: &str) -> CloudResult<Vec<u8>>;

    /// List objects with a prefix, ordered by key
    ///
    /// # Errors
    ///
    /// Returns an error if the bucket doesn't exist, permissions are not enough, or the listing fails
    fn list_objects(&self, bucket: &str, prefix: Option<&str>) -> CloudResult<Vec<ObjectMetadata>>;

    /// Check if an object exists
    ///
    /// # Errors
    ///
    /// Returns an error if permissions are not enough or the check fails
    fn object_exists(&self, bucket: &str, key: &str) -> CloudResult<bool>;
}

// ============================================================================
// WarehouseIO - Analytical Databases
// ============================================================================

/// How a load treats rows already in the destination table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteDisposition {
    /// Replace the table contents.
    Truncate,
    /// Add to the existing rows.
    Append,
}

/// Description of a warehouse dataset (a namespace of tables).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSpec {
    pub project: String,
    pub dataset: String,
    pub location: String,
    pub description: String,
}

impl DatasetSpec {
    /// `project.dataset`
    #[must_use]
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.project, self.dataset)
    }

    /// `project.dataset.table`
    #[must_use]
    pub fn table_id(&self, table: &str) -> String {
        format!("{}.{}.{}", self.project, self.dataset, table)
    }
}

/// Trait for analytical data warehouse operations
pub trait WarehouseIO: Send + Sync {
    /// Short label used in logs and run reports (e.g. `"bigquery"`).
    fn provider(&self) -> &str;

    /// Check if a dataset exists
    ///
    /// # Errors
    ///
    /// Returns an error if there's a connection issue or insufficient permissions
    fn dataset_exists(&self, dataset: &DatasetSpec) -> CloudResult<bool>;

    /// Create a dataset
    ///
    /// # Errors
    ///
    /// Returns an error if the dataset already exists or creation fails
    fn create_dataset(&self, dataset: &DatasetSpec) -> CloudResult<()>;

    /// Load header-first CSV bytes into `table_id`, creating the table with
    /// `schema` if needed. Returns the row count of the table after the load.
    ///
    /// # Errors
    ///
    /// Returns an error if the data does not match the schema or the load job fails
    fn load_csv(
        &self,
        table_id: &str,
        schema: &[SchemaField],
        csv: &[u8],
        disposition: WriteDisposition,
    ) -> CloudResult<u64>;
}

// ============================================================================
// DatasetProvider - External Dataset Catalog
// ============================================================================

/// Account used to sign in to a dataset catalog.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogCredentials {
    pub username: Option<String>,
    pub key: Option<String>,
}

impl CatalogCredentials {
    pub fn new(username: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            key: Some(key.into()),
        }
    }

    /// Both a username and a key are set and non-empty.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        present(&self.username) && present(&self.key)
    }
}

impl fmt::Debug for CatalogCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogCredentials")
            .field("username", &self.username)
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Trait for fetching a published dataset into a local directory.
pub trait DatasetProvider: Send + Sync {
    /// Short label used in logs (e.g. `"kaggle"`).
    fn provider(&self) -> &str;

    /// Sign in before the first fetch of a run. Catalogs without accounts
    /// accept any credentials.
    ///
    /// # Errors
    ///
    /// Returns an `Authentication` error if the catalog rejects `credentials`
    fn authenticate(&self, _credentials: &CatalogCredentials) -> CloudResult<()> {
        Ok(())
    }

    /// Download and unpack `dataset` (a catalog slug such as `owner/name`) into `dest`.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails, the dataset is unknown, or the transfer fails
    fn fetch(&self, dataset: &str, dest: &Path) -> CloudResult<()>;
}
