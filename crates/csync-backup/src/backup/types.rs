// ── Backup types ─────────────────────────────────────────────────────────────

use chrono::NaiveDateTime;
use csync_core::{CopyStats, FsError, FsResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_DIR_FORMAT: &str = "%Y-%m-%d (%Hh%Mm%Ss)";

/// What to back up, where to, and how many snapshots to keep.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BackupSettings {
    /// Engine paths copied into each snapshot, in order.
    #[serde(default)]
    pub sources: Vec<String>,
    /// Local directory that holds the snapshots. Must already exist.
    #[serde(default)]
    pub destination: PathBuf,
    /// chrono strftime pattern for snapshot directory names.
    #[serde(default = "default_dir_format")]
    pub dir_format: String,
    /// Snapshots retained after a run, including the new one.
    #[serde(default = "default_rotation")]
    pub rotation: u32,
}

fn default_dir_format() -> String {
    DEFAULT_DIR_FORMAT.into()
}
fn default_rotation() -> u32 {
    7
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            destination: PathBuf::new(),
            dir_format: default_dir_format(),
            rotation: default_rotation(),
        }
    }
}

impl BackupSettings {
    /// Reject settings that could never produce a usable snapshot.
    pub fn validate(&self) -> FsResult<()> {
        if self.rotation == 0 {
            return Err(FsError::configuration(
                "backup.rotation must be at least 1",
            ));
        }
        crate::backup::rotation::validate_format(&self.dir_format)
    }
}

/// A directory under the destination whose name parsed as a timestamp.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub timestamp: NaiveDateTime,
    pub name: String,
    pub path: PathBuf,
}

/// Outcome of deleting stale snapshots.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PruneReport {
    pub removed: Vec<PathBuf>,
    /// Snapshots that could not be removed, with the reason.
    pub failed: Vec<(PathBuf, String)>,
}

/// Copy statistics for one source.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceReport {
    pub source: String,
    pub stats: CopyStats,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupReport {
    pub snapshot: PathBuf,
    pub pruned: Option<PruneReport>,
    pub sources: Vec<SourceReport>,
}

impl BackupReport {
    pub fn totals(&self) -> CopyStats {
        let mut total = CopyStats::default();
        for s in &self.sources {
            total.absorb(s.stats);
        }
        total
    }
}
