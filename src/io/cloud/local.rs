//! Object storage on the local filesystem.
//!
//! Objects live at `<root>/<bucket>/<key>`. Useful for local runs that want
//! the object-store layout without a cloud account.

use crate::io::cloud::traits::{CloudIOError, CloudResult, ErrorKind, ObjectIO, ObjectMetadata};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct LocalObjectIO {
    root: PathBuf,
}

impl LocalObjectIO {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, bucket: &str, key: &str) -> CloudResult<PathBuf> {
        if key.split('/').any(|part| part == "..") || key.starts_with('/') {
            return Err(CloudIOError::new(
                ErrorKind::InvalidInput,
                format!("object key escapes bucket: {key}"),
            ));
        }
        Ok(self.root.join(bucket).join(key))
    }
}

fn map_io(path: &Path, e: &io::Error) -> CloudIOError {
    let kind = match e.kind() {
        io::ErrorKind::NotFound => ErrorKind::NotFound,
        io::ErrorKind::PermissionDenied => ErrorKind::Authorization,
        io::ErrorKind::TimedOut => ErrorKind::Timeout,
        _ => ErrorKind::InternalError,
    };
    CloudIOError::new(kind, format!("{}: {e}", path.display()))
}

fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}

impl ObjectIO for LocalObjectIO {
    fn provider(&self) -> &str {
        "local"
    }

    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: &[u8],
        _content_type: &str,
    ) -> CloudResult<()> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| map_io(parent, &e))?;
        }
        fs::write(&path, data).map_err(|e| map_io(&path, &e))
    }

    fn get_object(&self, bucket: &str, key: &str) -> CloudResult<Vec<u8>> {
        let path = self.object_path(bucket, key)?;
        fs::read(&path).map_err(|e| map_io(&path, &e))
    }

    fn list_objects(&self, bucket: &str, prefix: Option<&str>) -> CloudResult<Vec<ObjectMetadata>> {
        let bucket_dir = self.root.join(bucket);
        let mut files = Vec::new();
        walk(&bucket_dir, &mut files).map_err(|e| map_io(&bucket_dir, &e))?;
        let mut objects = Vec::with_capacity(files.len());
        for file in files {
            let Ok(rel) = file.strip_prefix(&bucket_dir) else {
                continue;
            };
            let key = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if prefix.is_some_and(|p| !key.starts_with(p)) {
                continue;
            }
            let size = fs::metadata(&file).map_err(|e| map_io(&file, &e))?.len();
            objects.push(ObjectMetadata {
                key,
                size,
                content_type: None,
            });
        }
        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }

    fn object_exists(&self, bucket: &str, key: &str) -> CloudResult<bool> {
        Ok(self.object_path(bucket, key)?.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_list_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectIO::new(dir.path());
        store
            .put_object("b", "nba_data/cleaned/team_cleaned.csv", b"a\n1\n", "text/csv")
            .unwrap();
        store.put_object("b", "other/x.csv", b"", "text/csv").unwrap();

        let listed = store.list_objects("b", Some("nba_data/")).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].key, "nba_data/cleaned/team_cleaned.csv");
        assert_eq!(listed[0].size, 4);
        assert_eq!(
            store.get_object("b", "nba_data/cleaned/team_cleaned.csv").unwrap(),
            b"a\n1\n"
        );
    }

    #[test]
    fn rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectIO::new(dir.path());
        let err = store.put_object("b", "../x", b"", "text/csv").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
    }

    #[test]
    fn missing_object_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectIO::new(dir.path());
        assert_eq!(store.get_object("b", "k").unwrap_err().kind, ErrorKind::NotFound);
        assert!(!store.object_exists("b", "k").unwrap());
    }
}
