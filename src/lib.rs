//! # Courtside
//!
//! A **batch cleaning pipeline** for two public basketball datasets: a
//! multi-table game database (players, teams, games, per-quarter line scores)
//! and a player-season table. Courtside turns them into five analytics-ready
//! tables and delivers each one to any number of destinations.
//!
//! ## Key Features
//!
//! - **Per-table cleaners** - renames, date floor, median/mode imputation, deduplication
//! - **Home/away splitting** - one wide game row becomes a home row and an away row
//! - **Historical team codes** - relocated franchises mapped to their current code before joining
//! - **Left join** - player seasons keep their row even when no team matches
//! - **Pluggable sinks** - local CSV, object storage, warehouse tables
//! - **Per-table isolation** - a bad table or destination never stops the rest of the run
//! - **Run report** - row counts, anomaly counters and delivery outcomes, as JSON
//!
//! ## Quick Start
//!
//! ```no_run
//! use courtside::catalog::SourceLayout;
//! use courtside::pipeline::Pipeline;
//! use courtside::sink::LocalFileSink;
//! use std::sync::Arc;
//!
//! let report = Pipeline::new(SourceLayout::default())
//!     .with_sink(Arc::new(LocalFileSink::new("output")))
//!     .run();
//! assert_eq!(report.tables.len(), 5);
//! ```
//!
//! ## Tables
//!
//! | table | source | destination table |
//! |-------|--------|-------------------|
//! | `player` | `csv/player.csv` | `players` |
//! | `team` | `csv/team.csv` | `teams` |
//! | `game` | `csv/game.csv` | `games` |
//! | `line_score` | `csv/line_score.csv` | `line_score` |
//! | `all_seasons` | `all_seasons.csv` | `all_seasons` |
//!
//! `all_seasons` is cleaned after `team`, which it joins against.

pub mod abbrev;
pub mod catalog;
pub mod clean;
pub mod config;
pub mod error;
pub mod io;
pub mod join;
pub mod metrics;
pub mod pipeline;
pub mod schema;
pub mod sink;
pub mod split;
pub mod stats;
pub mod table;
pub mod validation;

pub use abbrev::AbbreviationMap;
pub use catalog::{SourceLayout, TableKind};
pub use clean::{Cleaned, Cleaner, Upstream};
pub use config::{EtlConfig, load_config};
pub use error::{EtlError, Result};
pub use metrics::{Anomaly, TableMetrics};
pub use pipeline::{ExecMode, Pipeline, RunReport, TableStatus};
pub use sink::{LocalFileSink, ObjectStoreSink, Sink, WarehouseSink};
pub use split::SideSplitter;
pub use table::{Table, Value};
