//! Run orchestration: acquire, clean in two phases, deliver to sinks, report.
//!
//! Phase 1 runs every cleaner without dependencies (player, team, game,
//! line score), in parallel when the execution mode allows. Phase 2 runs the
//! cleaners that join against phase-1 output (all seasons, on team). A
//! failure stays with its table: a missing file or column fails that table, a
//! failed dependency fails its dependents, and a failed sink only marks that
//! one delivery.
//!
//! ```no_run
//! use courtside::catalog::SourceLayout;
//! use courtside::pipeline::Pipeline;
//! use courtside::sink::LocalFileSink;
//! use std::sync::Arc;
//!
//! let report = Pipeline::new(SourceLayout::new("data/basketball", "data/nba_players"))
//!     .with_sink(Arc::new(LocalFileSink::new("out")))
//!     .run();
//! println!("{}", report.summary());
//! ```

use crate::catalog::{BASKETBALL_DATASET, PLAYERS_DATASET, SourceLayout, TableKind};
use crate::clean::{Cleaned, Upstream, cleaner_for};
use crate::error::{EtlError, Result};
use crate::io::cloud::{CatalogCredentials, DatasetProvider, RetryConfig, retry_with_backoff};
use crate::io::csv::read_table;
use crate::metrics::{Anomaly, RunClock};
use crate::sink::{Delivery, Sink};
use anyhow::Context;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecMode {
    Sequential,
    /// Phase-1 cleaners on a rayon pool; `None` uses the global pool.
    Parallel { threads: Option<usize> },
}

impl Default for ExecMode {
    fn default() -> Self {
        Self::Parallel { threads: None }
    }
}

// ============================================================================
// Report
// ============================================================================

/// An error as it appears in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    pub kind: &'static str,
    pub message: String,
}

impl From<&EtlError> for ErrorInfo {
    fn from(e: &EtlError) -> Self {
        Self {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SinkOutcome {
    pub sink: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery: Option<Delivery>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl SinkOutcome {
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableStatus {
    pub table: TableKind,
    pub rows_in: usize,
    pub rows_out: usize,
    pub anomalies: BTreeMap<Anomaly, usize>,
    pub sinks: Vec<SinkOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl TableStatus {
    fn failed(table: TableKind, err: &EtlError) -> Self {
        Self {
            table,
            rows_in: 0,
            rows_out: 0,
            anomalies: BTreeMap::new(),
            sinks: Vec::new(),
            error: Some(err.into()),
        }
    }

    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    #[must_use]
    pub fn anomaly(&self, anomaly: Anomaly) -> usize {
        self.anomalies.get(&anomaly).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcquisitionStatus {
    pub dataset: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

/// Outcome of a whole run, one [`TableStatus`] per table in [`TableKind::ALL`] order.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub acquisition: Vec<AcquisitionStatus>,
    pub tables: Vec<TableStatus>,
}

impl RunReport {
    #[must_use]
    pub fn table(&self, kind: TableKind) -> Option<&TableStatus> {
        self.tables.iter().find(|t| t.table == kind)
    }

    /// Every table cleaned and every delivery succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.tables
            .iter()
            .all(|t| t.is_ok() && t.sinks.iter().all(SinkOutcome::is_ok))
    }

    /// Human-readable listing of tables, destinations, and failures.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for a in &self.acquisition {
            if let Some(err) = &a.error {
                let _ = writeln!(out, "acquisition {}: FAILED ({})", a.dataset, err.message);
            }
        }
        for t in &self.tables {
            match &t.error {
                Some(err) => {
                    let _ = writeln!(out, "{}: FAILED [{}] {}", t.table, err.kind, err.message);
                }
                None => {
                    let _ = writeln!(out, "{}: {} -> {} rows", t.table, t.rows_in, t.rows_out);
                }
            }
            for s in &t.sinks {
                match (&s.delivery, &s.error) {
                    (Some(d), _) => {
                        let _ = writeln!(out, "  {} -> {}", s.sink, d.destination);
                    }
                    (None, Some(err)) => {
                        let _ = writeln!(out, "  {} FAILED: {}", s.sink, err.message);
                    }
                    (None, None) => {}
                }
            }
        }
        let _ = write!(out, "finished in {} ms", self.elapsed_ms);
        out
    }

    /// Write the report as pretty JSON, creating parent directories.
    ///
    /// # Errors
    /// Returns an error if the directory or file cannot be written.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        let json = serde_json::to_vec_pretty(self).context("serialize run report")?;
        std::fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }
}

// ============================================================================
// Pipeline
// ============================================================================

struct Acquisition {
    provider: Arc<dyn DatasetProvider>,
    credentials: CatalogCredentials,
    retry: RetryConfig,
}

pub struct Pipeline {
    layout: SourceLayout,
    sinks: Vec<Arc<dyn Sink>>,
    acquisition: Option<Acquisition>,
    mode: ExecMode,
}

impl Pipeline {
    #[must_use]
    pub fn new(layout: SourceLayout) -> Self {
        Self {
            layout,
            sinks: Vec::new(),
            acquisition: None,
            mode: ExecMode::default(),
        }
    }

    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Sign in to `provider` and fetch both datasets before cleaning.
    #[must_use]
    pub fn with_acquisition(
        mut self,
        provider: Arc<dyn DatasetProvider>,
        credentials: CatalogCredentials,
        retry: RetryConfig,
    ) -> Self {
        self.acquisition = Some(Acquisition {
            provider,
            credentials,
            retry,
        });
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: ExecMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub const fn layout(&self) -> &SourceLayout {
        &self.layout
    }

    /// Run every stage. Never fails as a whole; per-table and per-sink errors
    /// are in the report.
    #[must_use]
    pub fn run(&self) -> RunReport {
        let started_at = Utc::now();
        let clock = RunClock::start();
        tracing::info!(sinks = self.sinks.len(), mode = ?self.mode, "run started");

        let acquisition = self.acquire();

        let (independent, dependent): (Vec<TableKind>, Vec<TableKind>) = TableKind::ALL
            .into_iter()
            .partition(|k| cleaner_for(*k).dependencies().is_empty());

        let phase1 = self.clean_phase1(&independent);
        let mut results: BTreeMap<TableKind, Result<Cleaned>> = phase1.into_iter().collect();

        let phase2: Vec<(TableKind, Result<Cleaned>)> = {
            let mut upstream = Upstream::new();
            for (kind, result) in &results {
                if let Ok(cleaned) = result {
                    upstream.insert(*kind, &cleaned.table);
                }
            }
            dependent
                .iter()
                .map(|&kind| (kind, self.clean_one(kind, &upstream)))
                .collect()
        };
        results.extend(phase2);

        let tables = TableKind::ALL
            .iter()
            .filter_map(|kind| results.remove_entry(kind))
            .map(|(kind, result)| self.deliver(kind, result))
            .collect();

        let report = RunReport {
            started_at,
            elapsed_ms: u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX),
            acquisition,
            tables,
        };
        tracing::info!(
            success = report.is_success(),
            elapsed_ms = report.elapsed_ms,
            "run finished"
        );
        report
    }

    fn acquire(&self) -> Vec<AcquisitionStatus> {
        let Some(acq) = &self.acquisition else {
            return Vec::new();
        };
        let signed_in =
            retry_with_backoff(&acq.retry, || acq.provider.authenticate(&acq.credentials));
        [BASKETBALL_DATASET, PLAYERS_DATASET]
            .into_iter()
            .map(|dataset| {
                let dest = self.layout.dataset_dir(dataset);
                let result = signed_in
                    .clone()
                    .and_then(|()| {
                        retry_with_backoff(&acq.retry, || acq.provider.fetch(dataset, dest))
                    })
                    .map_err(|source| EtlError::AcquisitionFailure {
                        dataset: dataset.to_string(),
                        source,
                    });
                match result {
                    Ok(()) => {
                        tracing::info!(dataset, provider = acq.provider.provider(), dest = %dest.display(), "dataset acquired");
                        AcquisitionStatus {
                            dataset: dataset.to_string(),
                            error: None,
                        }
                    }
                    Err(e) => {
                        tracing::warn!(dataset, error = %e, "acquisition failed, using existing local data");
                        AcquisitionStatus {
                            dataset: dataset.to_string(),
                            error: Some((&e).into()),
                        }
                    }
                }
            })
            .collect()
    }

    fn clean_phase1(&self, kinds: &[TableKind]) -> Vec<(TableKind, Result<Cleaned>)> {
        let upstream = Upstream::new();
        let run = |kind: &TableKind| (*kind, self.clean_one(*kind, &upstream));
        match self.mode {
            ExecMode::Sequential => kinds.iter().map(run).collect(),
            ExecMode::Parallel { threads: None } => kinds.par_iter().map(run).collect(),
            ExecMode::Parallel {
                threads: Some(threads),
            } => match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => pool.install(|| kinds.par_iter().map(run).collect()),
                Err(e) => {
                    tracing::warn!(error = %e, "thread pool unavailable, cleaning sequentially");
                    kinds.iter().map(run).collect()
                }
            },
        }
    }

    fn clean_one(&self, kind: TableKind, upstream: &Upstream<'_>) -> Result<Cleaned> {
        let cleaner = cleaner_for(kind);
        for &dep in cleaner.dependencies() {
            upstream.get(kind, dep)?;
        }
        let raw = read_table(self.layout.source_path(kind), kind.name())?;
        cleaner.clean(&raw, upstream)
    }

    fn deliver(&self, kind: TableKind, result: Result<Cleaned>) -> TableStatus {
        let cleaned = match result {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(table = %kind, kind = e.kind(), error = %e, "table failed");
                return TableStatus::failed(kind, &e);
            }
        };
        tracing::info!(
            table = %kind,
            rows_in = cleaned.metrics.rows_in,
            rows_out = cleaned.metrics.rows_out,
            "table cleaned"
        );
        cleaned.metrics.log(kind.name());

        let sinks = self
            .sinks
            .iter()
            .map(|sink| match sink.write(kind, &cleaned.table) {
                Ok(delivery) => {
                    tracing::info!(table = %kind, sink = sink.name(), destination = %delivery.destination, "table delivered");
                    SinkOutcome {
                        sink: sink.name().to_string(),
                        delivery: Some(delivery),
                        error: None,
                    }
                }
                Err(e) => {
                    let e = match e {
                        e @ EtlError::SinkFailure { .. } => e,
                        other => EtlError::sink(sink.name(), kind.name(), other.to_string()),
                    };
                    tracing::warn!(table = %kind, sink = sink.name(), error = %e, "delivery failed");
                    SinkOutcome {
                        sink: sink.name().to_string(),
                        delivery: None,
                        error: Some((&e).into()),
                    }
                }
            })
            .collect();

        TableStatus {
            table: kind,
            rows_in: cleaned.metrics.rows_in,
            rows_out: cleaned.metrics.rows_out,
            anomalies: cleaned.metrics.anomalies,
            sinks,
            error: None,
        }
    }
}
