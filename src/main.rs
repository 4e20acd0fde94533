use anyhow::{Context, Result};
use courtside::io::cloud::LocalObjectIO;
use courtside::{EtlConfig, LocalFileSink, ObjectStoreSink, Pipeline, load_config};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Names a TOML config file to use instead of `./courtside.toml`.
const CONFIG_PATH_VAR: &str = "COURTSIDE_CONFIG";

fn main() -> Result<ExitCode> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let config_file = std::env::var_os(CONFIG_PATH_VAR).map(PathBuf::from);
    let cfg = load_config(config_file.as_deref())
        .map_err(|e| anyhow::anyhow!("load configuration: {e}"))?;
    cfg.check().context("invalid configuration")?;

    let report = build_pipeline(&cfg).run();
    println!("{}", report.summary());

    if let Some(path) = &cfg.report_path {
        report.save_to_file(path)?;
        tracing::info!(path = %path.display(), "run report written");
    }

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn build_pipeline(cfg: &EtlConfig) -> Pipeline {
    let mut pipeline = Pipeline::new(cfg.layout())
        .with_mode(cfg.exec_mode())
        .with_sink(Arc::new(LocalFileSink::new(&cfg.output_dir)));

    match (&cfg.bucket, &cfg.object_store_root) {
        (Some(bucket), Some(root)) => {
            let store = Arc::new(LocalObjectIO::new(root));
            pipeline = pipeline.with_sink(Arc::new(ObjectStoreSink::new(
                store,
                bucket.clone(),
                cfg.object_prefix.clone(),
                cfg.retry,
            )));
        }
        (Some(bucket), None) => {
            tracing::warn!(bucket = %bucket, "bucket set without an object store root; uploads skipped");
        }
        _ => {}
    }

    if cfg.project_id.is_some() {
        tracing::warn!("no warehouse client is built into this binary; warehouse loads skipped");
    }
    if cfg.credentials.is_complete() {
        tracing::warn!("no dataset catalog client is built into this binary; acquisition skipped");
    } else {
        tracing::info!("no catalog credentials configured; acquisition skipped, using local data");
    }
    pipeline
}
