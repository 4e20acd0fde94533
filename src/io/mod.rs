//! Reading and writing tables, locally and remotely.
//!
//! - [`csv`]: CSV sources and the cleaned output files.
//! - [`compression`]: transparent gzip/zstd detection for both.
//! - [`cloud`]: object storage, warehouse, and dataset catalog seams.

pub mod cloud;
pub mod compression;
pub mod csv;

pub use self::csv::{read_table, read_table_from, table_to_csv_bytes, write_table};
