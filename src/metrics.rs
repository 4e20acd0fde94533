//! Counters for data-quality anomalies and run timing.
//!
//! Anomalies are conditions the cleaners resolve with a fixed policy (drop,
//! pass through, fill, null) rather than raise. Each cleaner returns a
//! [`TableMetrics`] next to its output so the run report can show what was
//! dropped or filled, and why.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

/// A data-quality condition handled by default policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Anomaly {
    /// A date string that could not be parsed; the row falls to the date floor.
    UnparsableDate,
    /// A row dated before the date floor (including unparsable dates).
    BeforeDateFloor,
    /// A row dropped as a repeat of an earlier row on the dedup key.
    DuplicateRow,
    /// A missing cell filled by median, mode, or a fixed default.
    ImputedCell,
    /// An abbreviation rewritten from a historical code.
    NormalizedAbbreviation,
    /// An abbreviation neither in the historical map nor among current team codes.
    UnmappedAbbreviation,
    /// A left-join row with no matching team.
    JoinMiss,
    /// A column in neither side family nor the common set of a split.
    UnclaimedColumn,
    /// A team code appearing on more than one team row.
    DuplicateTeamAbbreviation,
    /// A failed null or uniqueness check on a player or team id column.
    InvalidIdentifier,
}

impl Anomaly {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnparsableDate => "unparsable_date",
            Self::BeforeDateFloor => "before_date_floor",
            Self::DuplicateRow => "duplicate_row",
            Self::ImputedCell => "imputed_cell",
            Self::NormalizedAbbreviation => "normalized_abbreviation",
            Self::UnmappedAbbreviation => "unmapped_abbreviation",
            Self::JoinMiss => "join_miss",
            Self::UnclaimedColumn => "unclaimed_column",
            Self::DuplicateTeamAbbreviation => "duplicate_team_abbreviation",
            Self::InvalidIdentifier => "invalid_identifier",
        }
    }
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-table row counts and anomaly counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableMetrics {
    pub rows_in: usize,
    pub rows_out: usize,
    pub anomalies: BTreeMap<Anomaly, usize>,
}

impl TableMetrics {
    #[must_use]
    pub fn new(rows_in: usize) -> Self {
        Self {
            rows_in,
            ..Self::default()
        }
    }

    /// Add `n` occurrences of `anomaly`. Zero counts are not recorded.
    pub fn record(&mut self, anomaly: Anomaly, n: usize) {
        if n > 0 {
            *self.anomalies.entry(anomaly).or_default() += n;
        }
    }

    #[must_use]
    pub fn count(&self, anomaly: Anomaly) -> usize {
        self.anomalies.get(&anomaly).copied().unwrap_or(0)
    }

    /// Emit one `tracing` event per non-zero counter.
    pub fn log(&self, table: &str) {
        for (anomaly, count) in &self.anomalies {
            tracing::warn!(table, anomaly = anomaly.as_str(), count, "data quality anomaly");
        }
    }
}

/// Wall-clock span of a run.
#[derive(Debug, Clone, Copy)]
pub struct RunClock {
    start: Instant,
}

impl RunClock {
    #[must_use]
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
