// ── Recursive local copy ─────────────────────────────────────────────────────

use csync_core::{ensure_local_dir, CopyStats, FsError, FsResult};
use log::{debug, trace};
use std::path::Path;

/// Copy the directory `source` into `destination`, keeping its name:
/// `source = /a/b` lands at `destination/b/...`.
///
/// Existing directories are reused and existing files overwritten.
/// `source` itself may be a symlink to a directory; symlinks below it are
/// not followed and not copied.
pub fn copy_local_tree(source: &Path, destination: &Path) -> FsResult<CopyStats> {
    let name = source.file_name().ok_or_else(|| {
        FsError::configuration(format!(
            "Cannot copy '{}': source must name a directory",
            source.display()
        ))
    })?;
    if !source.is_dir() {
        return Err(FsError::not_found(format!(
            "'{}' is not a directory",
            source.display()
        ))
        .with_path(source.display().to_string()));
    }
    let target = destination.join(name);
    let mut stats = CopyStats::default();

    for entry in walkdir::WalkDir::new(source)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            let at = e
                .path()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| source.to_path_buf());
            FsError::from_io(std::io::Error::from(e), at)
        })?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| FsError::io(format!("Path strip error: {}", e)))?;
        let dest = target.join(relative);

        // A symlinked root reports the link's own type.
        let file_type = entry.file_type();
        if file_type.is_dir() || entry.depth() == 0 {
            if ensure_local_dir(&dest)? {
                stats.directories_created += 1;
            }
        } else if file_type.is_file() {
            let bytes = std::fs::copy(entry.path(), &dest)
                .map_err(|e| FsError::from_io(e, entry.path()))?;
            trace!("Copied {} ({} bytes)", entry.path().display(), bytes);
            stats.files_copied += 1;
            stats.bytes_copied += bytes;
        } else {
            debug!("Skipping non-regular entry {}", entry.path().display());
        }
    }
    Ok(stats)
}
