//! In-memory implementations of the cloud traits for tests and dry runs.
//!
//! Every fake keeps its state behind `Arc<Mutex<..>>` so clones share it:
//! hand one clone to the pipeline and keep another to inspect afterwards.
//! Each fake can be told to fail, either a fixed number of times (to exercise
//! retries) or on every call.

use crate::io::cloud::traits::{
    CatalogCredentials, CloudIOError, CloudResult, DatasetProvider, DatasetSpec, ErrorKind,
    ObjectIO, ObjectMetadata, WarehouseIO, WriteDisposition,
};
use crate::schema::SchemaField;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

// ============================================================================
// Fault injection
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct Fault {
    kind: ErrorKind,
    /// `None` fails forever.
    remaining: Option<u32>,
}

#[derive(Debug, Clone, Default)]
struct Faults {
    inner: Arc<Mutex<Option<Fault>>>,
}

impl Faults {
    fn set(&self, fault: Option<Fault>) {
        *self.inner.lock().expect("fault mutex poisoned") = fault;
    }

    /// Consume one scheduled failure, if any.
    fn check(&self, op: &str) -> CloudResult<()> {
        let mut slot = self.inner.lock().expect("fault mutex poisoned");
        let Some(fault) = *slot else {
            return Ok(());
        };
        match fault.remaining {
            None => {}
            Some(0) => {
                *slot = None;
                return Ok(());
            }
            Some(1) => *slot = None,
            Some(n) => {
                *slot = Some(Fault {
                    remaining: Some(n - 1),
                    ..fault
                });
            }
        }
        drop(slot);
        Err(CloudIOError::new(fault.kind, format!("injected failure in {op}")))
    }
}

// ============================================================================
// FakeObjectIO
// ============================================================================

type BucketStorage = Arc<Mutex<HashMap<String, BTreeMap<String, StoredObject>>>>;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    content_type: String,
}

#[derive(Clone, Default)]
pub struct FakeObjectIO {
    storage: BucketStorage,
    faults: Faults,
    puts: Arc<Mutex<u32>>,
}

impl FakeObjectIO {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `times` calls with `kind`, then behave normally.
    pub fn fail_next(&self, kind: ErrorKind, times: u32) {
        self.faults.set(Some(Fault {
            kind,
            remaining: Some(times),
        }));
    }

    /// Fail every call with `kind` for the life of this fake.
    pub fn fail_always(&self, kind: ErrorKind) {
        self.faults.set(Some(Fault {
            kind,
            remaining: None,
        }));
    }

    /// Number of `put_object` calls attempted, failed ones included.
    ///
    /// # Panics
    ///
    /// Panics if the counter mutex is poisoned.
    #[must_use]
    pub fn put_attempts(&self) -> u32 {
        *self.puts.lock().expect("counter mutex poisoned")
    }

    /// Content type recorded for an object.
    ///
    /// # Panics
    ///
    /// Panics if the storage mutex is poisoned.
    #[must_use]
    pub fn content_type(&self, bucket: &str, key: &str) -> Option<String> {
        self.storage
            .lock()
            .expect("storage mutex poisoned")
            .get(bucket)
            .and_then(|b| b.get(key))
            .map(|o| o.content_type.clone())
    }
}

impl ObjectIO for FakeObjectIO {
    fn provider(&self) -> &str {
        "fake-object-store"
    }

    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> CloudResult<()> {
        *self.puts.lock().expect("counter mutex poisoned") += 1;
        self.faults.check("put_object")?;
        self.storage
            .lock()
            .expect("storage mutex poisoned")
            .entry(bucket.to_string())
            .or_default()
            .insert(
                key.to_string(),
                StoredObject {
                    data: data.to_vec(),
                    content_type: content_type.to_string(),
                },
            );
        Ok(())
    }

    fn get_object(&self, bucket: &str, key: &str) -> CloudResult<Vec<u8>> {
        self.faults.check("get_object")?;
        let storage = self.storage.lock().expect("storage mutex poisoned");
        storage
            .get(bucket)
            .and_then(|b| b.get(key))
            .map(|o| o.data.clone())
            .ok_or_else(|| {
                CloudIOError::new(
                    ErrorKind::NotFound,
                    format!("Object {bucket}/{key} not found"),
                )
            })
    }

    fn list_objects(&self, bucket: &str, prefix: Option<&str>) -> CloudResult<Vec<ObjectMetadata>> {
        self.faults.check("list_objects")?;
        let storage = self.storage.lock().expect("storage mutex poisoned");
        let bucket_map = storage.get(bucket).ok_or_else(|| {
            CloudIOError::new(ErrorKind::NotFound, format!("Bucket {bucket} not found"))
        })?;
        Ok(bucket_map
            .iter()
            .filter(|(key, _)| prefix.is_none_or(|p| key.starts_with(p)))
            .map(|(key, obj)| ObjectMetadata {
                key: key.clone(),
                size: obj.data.len() as u64,
                content_type: Some(obj.content_type.clone()),
            })
            .collect())
    }

    fn object_exists(&self, bucket: &str, key: &str) -> CloudResult<bool> {
        self.faults.check("object_exists")?;
        Ok(self
            .storage
            .lock()
            .expect("storage mutex poisoned")
            .get(bucket)
            .is_some_and(|b| b.contains_key(key)))
    }
}

// ============================================================================
// FakeWarehouseIO
// ============================================================================

#[derive(Debug, Clone)]
struct StoredTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

#[derive(Clone, Default)]
pub struct FakeWarehouseIO {
    datasets: Arc<Mutex<HashSet<String>>>,
    tables: Arc<Mutex<HashMap<String, StoredTable>>>,
    faults: Faults,
}

impl FakeWarehouseIO {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `times` calls with `kind`, then behave normally.
    pub fn fail_next(&self, kind: ErrorKind, times: u32) {
        self.faults.set(Some(Fault {
            kind,
            remaining: Some(times),
        }));
    }

    /// Fail every call with `kind` for the life of this fake.
    pub fn fail_always(&self, kind: ErrorKind) {
        self.faults.set(Some(Fault {
            kind,
            remaining: None,
        }));
    }

    /// Whether `project.dataset` has been created.
    ///
    /// # Panics
    ///
    /// Panics if the datasets mutex is poisoned.
    #[must_use]
    pub fn has_dataset(&self, qualified: &str) -> bool {
        self.datasets
            .lock()
            .expect("datasets mutex poisoned")
            .contains(qualified)
    }

    /// Rows currently stored in `table_id`, or `None` if it was never loaded.
    ///
    /// # Panics
    ///
    /// Panics if the tables mutex is poisoned.
    #[must_use]
    pub fn row_count(&self, table_id: &str) -> Option<usize> {
        self.tables
            .lock()
            .expect("tables mutex poisoned")
            .get(table_id)
            .map(|t| t.rows.len())
    }

    /// Stored header and rows of `table_id`.
    ///
    /// # Panics
    ///
    /// Panics if the tables mutex is poisoned.
    #[must_use]
    pub fn rows(&self, table_id: &str) -> Option<(Vec<String>, Vec<Vec<String>>)> {
        self.tables
            .lock()
            .expect("tables mutex poisoned")
            .get(table_id)
            .map(|t| (t.header.clone(), t.rows.clone()))
    }
}

fn parse_csv(csv: &[u8]) -> CloudResult<(Vec<String>, Vec<Vec<String>>)> {
    let invalid = |e: csv::Error| CloudIOError::new(ErrorKind::InvalidInput, e.to_string());
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(csv);
    let header = reader
        .headers()
        .map_err(invalid)?
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader
        .records()
        .map(|r| r.map(|rec| rec.iter().map(str::to_string).collect()))
        .collect::<Result<Vec<Vec<String>>, _>>()
        .map_err(invalid)?;
    Ok((header, rows))
}

fn dataset_of(table_id: &str) -> Option<&str> {
    table_id.rsplit_once('.').map(|(dataset, _)| dataset)
}

impl WarehouseIO for FakeWarehouseIO {
    fn provider(&self) -> &str {
        "fake-warehouse"
    }

    fn dataset_exists(&self, dataset: &DatasetSpec) -> CloudResult<bool> {
        self.faults.check("dataset_exists")?;
        Ok(self.has_dataset(&dataset.qualified()))
    }

    fn create_dataset(&self, dataset: &DatasetSpec) -> CloudResult<()> {
        self.faults.check("create_dataset")?;
        let mut datasets = self.datasets.lock().expect("datasets mutex poisoned");
        if !datasets.insert(dataset.qualified()) {
            return Err(CloudIOError::new(
                ErrorKind::AlreadyExists,
                format!("Dataset {} already exists", dataset.qualified()),
            ));
        }
        Ok(())
    }

    fn load_csv(
        &self,
        table_id: &str,
        schema: &[SchemaField],
        csv: &[u8],
        disposition: WriteDisposition,
    ) -> CloudResult<u64> {
        self.faults.check("load_csv")?;
        let dataset = dataset_of(table_id).unwrap_or_default();
        if !self.has_dataset(dataset) {
            return Err(CloudIOError::new(
                ErrorKind::NotFound,
                format!("Dataset {dataset} not found"),
            ));
        }
        let (header, rows) = parse_csv(csv)?;
        for field in schema.iter().filter(|f| f.is_required()) {
            let Some(idx) = header.iter().position(|h| *h == field.name) else {
                return Err(CloudIOError::new(
                    ErrorKind::InvalidInput,
                    format!("required field {} missing from load", field.name),
                ));
            };
            if rows.iter().any(|r| r.get(idx).is_none_or(String::is_empty)) {
                return Err(CloudIOError::new(
                    ErrorKind::InvalidInput,
                    format!("required field {} has null values", field.name),
                ));
            }
        }

        let mut tables = self.tables.lock().expect("tables mutex poisoned");
        let stored: &StoredTable = match disposition {
            WriteDisposition::Truncate => {
                tables.insert(
                    table_id.to_string(),
                    StoredTable {
                        header,
                        rows,
                    },
                );
                &tables[table_id]
            }
            WriteDisposition::Append => {
                let entry = tables
                    .entry(table_id.to_string())
                    .or_insert_with(|| StoredTable {
                        header: header.clone(),
                        rows: Vec::new(),
                    });
                if entry.header != header {
                    return Err(CloudIOError::new(
                        ErrorKind::InvalidInput,
                        format!("header of append to {table_id} does not match"),
                    ));
                }
                entry.rows.extend(rows);
                entry
            }
        };
        Ok(stored.rows.len() as u64)
    }
}

// ============================================================================
// FakeDatasetProvider
// ============================================================================

/// Records fetch requests. Optionally writes canned files into the destination.
#[derive(Clone, Default)]
pub struct FakeDatasetProvider {
    fetched: Arc<Mutex<Vec<(String, PathBuf)>>>,
    files: Arc<Mutex<HashMap<String, Vec<(String, Vec<u8>)>>>>,
    accepted: Arc<Mutex<Option<CatalogCredentials>>>,
    signed_in: Arc<Mutex<Option<String>>>,
    faults: Faults,
}

impl FakeDatasetProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `data` at `relative_path` under the destination whenever `dataset` is fetched.
    ///
    /// # Panics
    ///
    /// Panics if the files mutex is poisoned.
    pub fn add_file(&self, dataset: &str, relative_path: &str, data: impl Into<Vec<u8>>) {
        self.files
            .lock()
            .expect("files mutex poisoned")
            .entry(dataset.to_string())
            .or_default()
            .push((relative_path.to_string(), data.into()));
    }

    /// Fail every fetch with `kind`.
    pub fn fail_always(&self, kind: ErrorKind) {
        self.faults.set(Some(Fault {
            kind,
            remaining: None,
        }));
    }

    /// Reject sign-ins with anything other than `credentials`.
    ///
    /// # Panics
    ///
    /// Panics if the credentials mutex is poisoned.
    pub fn accept_only(&self, credentials: CatalogCredentials) {
        *self.accepted.lock().expect("credentials mutex poisoned") = Some(credentials);
    }

    /// Username of the last successful sign-in.
    ///
    /// # Panics
    ///
    /// Panics if the sign-in mutex is poisoned.
    #[must_use]
    pub fn signed_in_as(&self) -> Option<String> {
        self.signed_in.lock().expect("sign-in mutex poisoned").clone()
    }

    /// Datasets requested so far, in order, with their destinations.
    ///
    /// # Panics
    ///
    /// Panics if the fetch log mutex is poisoned.
    #[must_use]
    pub fn fetched(&self) -> Vec<(String, PathBuf)> {
        self.fetched.lock().expect("fetch log mutex poisoned").clone()
    }
}

impl DatasetProvider for FakeDatasetProvider {
    fn provider(&self) -> &str {
        "fake-catalog"
    }

    fn authenticate(&self, credentials: &CatalogCredentials) -> CloudResult<()> {
        let accepted = self.accepted.lock().expect("credentials mutex poisoned");
        if accepted.as_ref().is_some_and(|a| a != credentials) {
            return Err(CloudIOError::new(
                ErrorKind::Authentication,
                "catalog rejected the credentials",
            ));
        }
        *self.signed_in.lock().expect("sign-in mutex poisoned") = credentials.username.clone();
        Ok(())
    }

    fn fetch(&self, dataset: &str, dest: &Path) -> CloudResult<()> {
        self.fetched
            .lock()
            .expect("fetch log mutex poisoned")
            .push((dataset.to_string(), dest.to_path_buf()));
        self.faults.check("fetch")?;
        let files = self.files.lock().expect("files mutex poisoned");
        for (rel, data) in files.get(dataset).into_iter().flatten() {
            let path = dest.join(rel);
            let io_err = |e: std::io::Error| {
                CloudIOError::new(ErrorKind::InternalError, format!("{}: {e}", path.display()))
            };
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
            std::fs::write(&path, data).map_err(io_err)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldMode, FieldType};

    fn spec() -> DatasetSpec {
        DatasetSpec {
            project: "p".into(),
            dataset: "nba_analytics".into(),
            location: "US".into(),
            description: String::new(),
        }
    }

    #[test]
    fn fail_next_recovers() {
        let store = FakeObjectIO::new();
        store.fail_next(ErrorKind::Timeout, 1);
        assert!(store.put_object("b", "k", b"x", "text/csv").is_err());
        assert!(store.put_object("b", "k", b"x", "text/csv").is_ok());
        assert_eq!(store.put_attempts(), 2);
        assert_eq!(store.content_type("b", "k").as_deref(), Some("text/csv"));
    }

    #[test]
    fn truncate_replaces_rows() {
        let wh = FakeWarehouseIO::new();
        wh.create_dataset(&spec()).unwrap();
        let schema = [SchemaField::new("id", FieldType::Integer, FieldMode::Required)];
        let id = spec().table_id("t");
        wh.load_csv(&id, &schema, b"id\n1\n2\n", WriteDisposition::Truncate)
            .unwrap();
        let n = wh
            .load_csv(&id, &schema, b"id\n3\n", WriteDisposition::Truncate)
            .unwrap();
        assert_eq!(n, 1);
        let n = wh
            .load_csv(&id, &schema, b"id\n4\n", WriteDisposition::Append)
            .unwrap();
        assert_eq!(n, 2);
    }

    #[test]
    fn load_rejects_null_required_field() {
        let wh = FakeWarehouseIO::new();
        wh.create_dataset(&spec()).unwrap();
        let schema = [SchemaField::new("id", FieldType::Integer, FieldMode::Required)];
        let err = wh
            .load_csv(&spec().table_id("t"), &schema, b"id,name\n,x\n", WriteDisposition::Truncate)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
    }
}
