//! Snapshot naming and the rotation policy.

use crate::backup::types::{PruneReport, Snapshot};
use chrono::format::{Item, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime};
use csync_core::{FsError, FsResult};
use log::{debug, info, warn};
use std::fmt::Write as _;
use std::path::Path;

/// Rewrite a bare `%f` as `%6f`: snapshot names carry microseconds, while
/// chrono reads `%f` as nanoseconds.
fn chrono_pattern(format: &str) -> String {
    let mut out = String::with_capacity(format.len() + 1);
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        out.push(c);
        if c == '%' {
            match chars.next() {
                Some('f') => out.push_str("6f"),
                Some(next) => out.push(next),
                None => {}
            }
        }
    }
    out
}

/// Format `now` into a snapshot directory name.
pub fn snapshot_name(now: NaiveDateTime, format: &str) -> FsResult<String> {
    let pattern = chrono_pattern(format);
    let items: Vec<Item<'_>> = StrftimeItems::new(&pattern).collect();
    if format.is_empty() || items.iter().any(|i| matches!(i, Item::Error)) {
        return Err(FsError::configuration(format!(
            "Invalid snapshot name format '{}'",
            format
        )));
    }
    let mut name = String::new();
    write!(name, "{}", now.format_with_items(items.into_iter())).map_err(|_| {
        FsError::configuration(format!(
            "Snapshot name format '{}' cannot be rendered from a local time",
            format
        ))
    })?;
    if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        return Err(FsError::configuration(format!(
            "Snapshot name format '{}' does not yield a directory name",
            format
        )));
    }
    Ok(name)
}

/// Check that `format` renders a usable directory name.
pub fn validate_format(format: &str) -> FsResult<()> {
    let probe = NaiveDate::from_ymd_opt(2001, 2, 3)
        .and_then(|d| d.and_hms_opt(4, 5, 6))
        .ok_or_else(|| FsError::configuration("invalid probe date"))?;
    let rendered = snapshot_name(probe, format)?;
    if parse_snapshot_name(&rendered, format).is_none() {
        warn!(
            "Snapshot names from '{}' cannot be parsed back; old snapshots will never be rotated",
            format
        );
    }
    Ok(())
}

/// Parse a directory name back into its timestamp.
///
/// Date-only formats read as midnight.
pub fn parse_snapshot_name(name: &str, format: &str) -> Option<NaiveDateTime> {
    let pattern = chrono_pattern(format);
    NaiveDateTime::parse_from_str(name, &pattern)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(name, &pattern)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Snapshots in `destination` that should go before a new one is made,
/// oldest first.
///
/// Only directories whose names parse under `format` count. Of those,
/// the newest `rotation - 1` are kept; a rotation of 1 (or 0) makes
/// every snapshot stale.
pub fn stale_snapshots(
    destination: &Path,
    format: &str,
    rotation: u32,
) -> FsResult<Vec<Snapshot>> {
    let mut snapshots = Vec::new();
    let entries =
        std::fs::read_dir(destination).map_err(|e| FsError::from_io(e, destination))?;
    for entry in entries {
        let entry = entry.map_err(|e| FsError::from_io(e, destination))?;
        let is_dir = entry
            .file_type()
            .map_err(|e| FsError::from_io(e, entry.path()))?
            .is_dir();
        if !is_dir {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        match parse_snapshot_name(&name, format) {
            Some(timestamp) => snapshots.push(Snapshot {
                timestamp,
                name,
                path: entry.path(),
            }),
            None => debug!("'{}' is not a snapshot, ignoring", name),
        }
    }

    snapshots.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.name.cmp(&b.name)));

    let keep = rotation.saturating_sub(1) as usize;
    if snapshots.len() > keep {
        snapshots.truncate(snapshots.len() - keep);
        Ok(snapshots)
    } else {
        Ok(Vec::new())
    }
}

/// Delete `stale` snapshots. A failure is logged and does not stop the rest.
pub fn prune_stale(stale: &[Snapshot]) -> PruneReport {
    let mut report = PruneReport::default();
    for snapshot in stale {
        match std::fs::remove_dir_all(&snapshot.path) {
            Ok(()) => {
                info!("Removed outdated snapshot '{}'", snapshot.name);
                report.removed.push(snapshot.path.clone());
            }
            Err(e) => {
                warn!(
                    "Could not remove outdated snapshot {}: {}",
                    snapshot.path.display(),
                    e
                );
                report.failed.push((snapshot.path.clone(), e.to_string()));
            }
        }
    }
    report
}
