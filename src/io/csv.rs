//! CSV reading and writing for [`Table`]s.
//!
//! - [`read_table`] loads a header-first CSV into a raw table. Every field is
//!   kept as text; NA markers become nulls.
//! - [`write_table`] writes a header row followed by one record per row, with
//!   no index column, creating parent directories as needed.
//! - [`table_to_csv_bytes`] renders the same bytes in memory for uploads.
//!
//! Compression is detected from the path (and, for reads, the magic bytes) via
//! [`crate::io::compression`].

use crate::error::{EtlError, Result};
use crate::io::compression::{auto_detect_reader, auto_detect_writer};
use crate::table::{Table, Value};
use csv::{ReaderBuilder, WriterBuilder};
use std::fs::{File, create_dir_all};
use std::io::{Read, Write};
use std::path::Path;

/// Read a CSV file with a header row into a [`Table`] named `name`.
///
/// # Errors
/// [`EtlError::MissingSourceFile`] if `path` does not exist, otherwise a CSV or
/// IO error annotated with the path.
pub fn read_table(path: impl AsRef<Path>, name: &str) -> Result<Table> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(EtlError::MissingSourceFile {
            table: name.to_string(),
            path: path.to_path_buf(),
        });
    }
    let f = File::open(path).map_err(|source| EtlError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let rdr = auto_detect_reader(f, path).map_err(|source| EtlError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_table_from(rdr, name).map_err(|source| EtlError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse CSV text from any reader. Records may be ragged; missing trailing
/// fields become nulls.
///
/// # Errors
/// Returns the underlying [`csv::Error`] on malformed input.
pub fn read_table_from<R: Read>(reader: R, name: &str) -> std::result::Result<Table, csv::Error> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let mut table = Table::new(name, headers);
    for rec in rdr.records() {
        let rec = rec?;
        table.push_row(rec.iter().map(Value::from_raw).collect());
    }
    Ok(table)
}

/// Write `table` as CSV to `path`.
///
/// # Returns
/// The number of data rows written.
///
/// # Errors
/// Returns an error if directories or the file cannot be created, or a row
/// fails to serialize.
pub fn write_table(path: impl AsRef<Path>, table: &Table) -> Result<usize> {
    let path = path.as_ref();
    let io_err = |source: std::io::Error| EtlError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).map_err(io_err)?;
    }
    let f = File::create(path).map_err(io_err)?;
    let w = auto_detect_writer(f, path).map_err(io_err)?;
    let mut w = write_table_to(w, table).map_err(|source| EtlError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    w.flush().map_err(io_err)?;
    Ok(table.len())
}

/// Render `table` as CSV bytes.
///
/// # Errors
/// Returns an error if a row fails to serialize.
pub fn table_to_csv_bytes(table: &Table) -> std::result::Result<Vec<u8>, csv::Error> {
    write_table_to(Vec::with_capacity(table.len().saturating_mul(64)), table)
}

fn write_table_to<W: Write>(writer: W, table: &Table) -> std::result::Result<W, csv::Error> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(table.columns())?;
    for row in table.rows() {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    wtr.into_inner().map_err(|e| csv::Error::from(e.into_error()))
}
