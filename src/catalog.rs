//! The five fixed tables a run produces, and where each one comes from and goes to.

use crate::io::compression;
use crate::schema::{self, SchemaField};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Catalog slug of the multi-table sports database.
pub const BASKETBALL_DATASET: &str = "wyattowalsh/basketball";
/// Catalog slug of the player-season dataset.
pub const PLAYERS_DATASET: &str = "justinas/nba-players-data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Player,
    Team,
    Game,
    LineScore,
    AllSeasons,
}

impl TableKind {
    /// Every table, in the order the run reports them.
    pub const ALL: [Self; 5] = [
        Self::Player,
        Self::Team,
        Self::Game,
        Self::LineScore,
        Self::AllSeasons,
    ];

    /// Source table name; also the stem of the raw and cleaned file names.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Team => "team",
            Self::Game => "game",
            Self::LineScore => "line_score",
            Self::AllSeasons => "all_seasons",
        }
    }

    /// Name of the cleaned CSV file.
    #[must_use]
    pub fn file_name(self) -> String {
        format!("{}_cleaned.csv", self.name())
    }

    /// Destination warehouse table.
    #[must_use]
    pub const fn warehouse_table(self) -> &'static str {
        match self {
            Self::Player => "players",
            Self::Team => "teams",
            Self::Game => "games",
            Self::LineScore => "line_score",
            Self::AllSeasons => "all_seasons",
        }
    }

    #[must_use]
    pub fn schema(self) -> Vec<SchemaField> {
        match self {
            Self::Player => schema::players(),
            Self::Team => schema::teams(),
            Self::Game => schema::games(),
            Self::LineScore => schema::line_score(),
            Self::AllSeasons => schema::all_seasons(),
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Local directories the acquisition step unpacks the two datasets into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLayout {
    pub basketball_dir: PathBuf,
    pub players_dir: PathBuf,
}

impl SourceLayout {
    pub fn new(basketball_dir: impl Into<PathBuf>, players_dir: impl Into<PathBuf>) -> Self {
        Self {
            basketball_dir: basketball_dir.into(),
            players_dir: players_dir.into(),
        }
    }

    /// Directory a dataset is unpacked into.
    #[must_use]
    pub fn dataset_dir(&self, dataset: &str) -> &Path {
        if dataset == PLAYERS_DATASET {
            &self.players_dir
        } else {
            &self.basketball_dir
        }
    }

    /// Path of the raw CSV for `kind`.
    ///
    /// The sports database keeps its tables under a `csv/` subdirectory; the
    /// player-season dataset is a single file at its root.
    #[must_use]
    pub fn raw_path(&self, kind: TableKind) -> PathBuf {
        match kind {
            TableKind::AllSeasons => self.players_dir.join("all_seasons.csv"),
            other => self
                .basketball_dir
                .join("csv")
                .join(format!("{}.csv", other.name())),
        }
    }

    /// The file to read for `kind`: the plain CSV if present, else a
    /// compressed sibling such as `game.csv.gz`. Falls back to the plain path
    /// so a missing source is reported under its usual name.
    #[must_use]
    pub fn source_path(&self, kind: TableKind) -> PathBuf {
        let plain = self.raw_path(kind);
        if plain.is_file() {
            return plain;
        }
        compression::extensions()
            .map(|ext| {
                let mut name = plain.clone().into_os_string();
                name.push(ext);
                PathBuf::from(name)
            })
            .find(|p| p.is_file())
            .unwrap_or(plain)
    }
}

impl Default for SourceLayout {
    fn default() -> Self {
        Self::new("data/basketball", "data/nba_players")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_paths_follow_dataset_layout() {
        let layout = SourceLayout::new("/d/b", "/d/p");
        assert_eq!(layout.raw_path(TableKind::Game), PathBuf::from("/d/b/csv/game.csv"));
        assert_eq!(
            layout.raw_path(TableKind::AllSeasons),
            PathBuf::from("/d/p/all_seasons.csv")
        );
    }

    #[test]
    fn source_path_prefers_plain_csv() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        let layout = SourceLayout::new(dir.path(), dir.path());
        let plain = layout.raw_path(TableKind::AllSeasons);
        assert_eq!(layout.source_path(TableKind::AllSeasons), plain);

        std::fs::write(&plain, "id\n")?;
        std::fs::write(dir.path().join("all_seasons.csv.gz"), b"")?;
        assert_eq!(layout.source_path(TableKind::AllSeasons), plain);
        Ok(())
    }

    #[test]
    fn output_names() {
        assert_eq!(TableKind::LineScore.file_name(), "line_score_cleaned.csv");
        assert_eq!(TableKind::Player.warehouse_table(), "players");
    }
}
