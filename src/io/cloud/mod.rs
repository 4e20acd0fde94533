//! Remote destinations and sources behind provider-agnostic traits.
//!
//! - [`ObjectIO`]: object storage the cleaned CSV files are uploaded to.
//! - [`WarehouseIO`]: analytical warehouse the cleaned tables are loaded into.
//! - [`DatasetProvider`]: external catalog the raw datasets are fetched from.
//!
//! All traits are synchronous. Each comes with an in-memory fake in [`fake`],
//! and object storage also has a filesystem implementation in [`local`].
//! [`helpers`] holds the retry policy wrapped around every remote call.
//!
//! ```
//! use courtside::io::cloud::{FakeObjectIO, ObjectIO};
//!
//! # fn main() -> courtside::io::cloud::CloudResult<()> {
//! let store = FakeObjectIO::new();
//! store.put_object("bucket", "nba_data/cleaned/team_cleaned.csv", b"team_id\n1\n", "text/csv")?;
//! assert!(store.object_exists("bucket", "nba_data/cleaned/team_cleaned.csv")?);
//! # Ok(())
//! # }
//! ```

pub mod fake;
pub mod helpers;
pub mod local;
pub mod traits;

pub use fake::{FakeDatasetProvider, FakeObjectIO, FakeWarehouseIO};
pub use helpers::{RetryConfig, object_key, retry_with_backoff};
pub use local::LocalObjectIO;
pub use traits::*;
