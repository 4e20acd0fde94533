//! Run configuration.
//!
//! Layered lowest to highest:
//! 1. Built-in defaults ([`EtlConfig::default`])
//! 2. A TOML file (an explicit path, else `courtside.toml` in the working directory if present)
//! 3. `KAGGLE_USERNAME` / `KAGGLE_KEY`, read into [`EtlConfig::credentials`]
//! 4. Environment variables prefixed `COURTSIDE_`; nested keys use `__`
//!    (`COURTSIDE_RETRY__MAX_ATTEMPTS=5`, `COURTSIDE_CREDENTIALS__KEY=...`)
//!
//! The binary also loads a `.env` file before reading the environment.

use crate::catalog::SourceLayout;
use crate::io::cloud::helpers::validate_bucket_name;
use crate::io::cloud::{CatalogCredentials, CloudResult, DatasetSpec, RetryConfig};
use crate::pipeline::ExecMode;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "COURTSIDE_";
pub const DEFAULT_CONFIG_FILE: &str = "courtside.toml";

/// Catalog account variables honoured without the `COURTSIDE_` prefix.
const CATALOG_ENV: [(&str, &str); 2] = [
    ("KAGGLE_USERNAME", "credentials.username"),
    ("KAGGLE_KEY", "credentials.key"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
    /// Unpacked sports database; raw tables are under `csv/`.
    pub basketball_dir: PathBuf,
    /// Unpacked player-season dataset.
    pub players_dir: PathBuf,
    /// Where cleaned CSV files are written.
    pub output_dir: PathBuf,
    /// Object-store bucket; uploads are skipped when unset.
    pub bucket: Option<String>,
    pub object_prefix: String,
    /// Directory backing the filesystem object store.
    pub object_store_root: Option<PathBuf>,
    /// Warehouse project; loads are skipped when unset.
    pub project_id: Option<String>,
    pub dataset_id: String,
    pub dataset_location: String,
    pub parallel: bool,
    /// Worker threads for parallel cleaning; unset uses one per core.
    pub threads: Option<usize>,
    pub retry: RetryConfig,
    /// Dataset catalog account used by acquisition.
    pub credentials: CatalogCredentials,
    /// Where the JSON run report is written, if anywhere.
    pub report_path: Option<PathBuf>,
}

impl Default for EtlConfig {
    fn default() -> Self {
        let layout = SourceLayout::default();
        Self {
            basketball_dir: layout.basketball_dir,
            players_dir: layout.players_dir,
            output_dir: PathBuf::from("output"),
            bucket: None,
            object_prefix: "nba_data/cleaned".to_string(),
            object_store_root: None,
            project_id: None,
            dataset_id: "nba_analytics".to_string(),
            dataset_location: "US".to_string(),
            parallel: true,
            threads: None,
            retry: RetryConfig::default(),
            credentials: CatalogCredentials::default(),
            report_path: None,
        }
    }
}

impl EtlConfig {
    #[must_use]
    pub fn layout(&self) -> SourceLayout {
        SourceLayout::new(&self.basketball_dir, &self.players_dir)
    }

    #[must_use]
    pub const fn exec_mode(&self) -> ExecMode {
        if self.parallel {
            ExecMode::Parallel {
                threads: self.threads,
            }
        } else {
            ExecMode::Sequential
        }
    }

    /// The warehouse dataset, when a project is configured.
    #[must_use]
    pub fn dataset_spec(&self) -> Option<DatasetSpec> {
        self.project_id.as_ref().map(|project| DatasetSpec {
            project: project.clone(),
            dataset: self.dataset_id.clone(),
            location: self.dataset_location.clone(),
            description: "NBA analytics tables (1996 onward)".to_string(),
        })
    }

    /// Reject settings that would only fail later, mid-run.
    ///
    /// # Errors
    /// Returns an `InvalidInput` error for a malformed bucket name.
    pub fn check(&self) -> CloudResult<()> {
        if let Some(bucket) = &self.bucket {
            validate_bucket_name(bucket)?;
        }
        Ok(())
    }
}

/// Load configuration from defaults, an optional TOML file, and the environment.
///
/// # Errors
/// Returns an error if a source cannot be parsed or a value has the wrong type.
pub fn load_config(file: Option<&Path>) -> Result<EtlConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(EtlConfig::default()));

    match file {
        Some(path) => figment = figment.merge(Toml::file_exact(path)),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            figment = figment.merge(Toml::file(DEFAULT_CONFIG_FILE));
        }
        None => {}
    }

    let catalog_keys = CATALOG_ENV.map(|(var, _)| var);
    figment = figment
        .merge(Env::raw().only(&catalog_keys).map(|key| {
            CATALOG_ENV
                .iter()
                .find(|(var, _)| key.as_str().eq_ignore_ascii_case(var))
                .map_or_else(|| key.as_str().into(), |(_, path)| (*path).into())
        }))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));
    figment.extract().map_err(Box::new)
}
