// ── Callback tree walk ───────────────────────────────────────────────────────
//
// SFTP has no per-step descending walk; the transport primitive is one
// recursive traversal that reports each file, directory and other entry
// through a callback. `collect_tree` runs it once and regroups the flat
// results with `csync_core::rebuild_tree`.

use crate::sftp::error::sftp_error;
use csync_core::{path, rebuild_tree, FsResult, TreeEntry};
use std::path::Path;

/// What a directory entry is, without following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteKind {
    File,
    Directory,
    /// Symlinks, sockets, devices, pipes.
    Other,
}

impl RemoteKind {
    /// Classify from the `st_mode` bits.
    pub fn from_mode(mode: Option<u32>) -> Self {
        match mode.map(|m| m & 0o170000) {
            Some(0o040000) => RemoteKind::Directory,
            Some(0o100000) => RemoteKind::File,
            _ => RemoteKind::Other,
        }
    }
}

/// Lists one directory: `(name, kind)` per child, sorted by name,
/// without `.` and `..`.
pub trait DirReader {
    fn read_dir(&self, dir: &str) -> FsResult<Vec<(String, RemoteKind)>>;
}

impl DirReader for ssh2::Sftp {
    fn read_dir(&self, dir: &str) -> FsResult<Vec<(String, RemoteKind)>> {
        let raw = self
            .readdir(Path::new(dir))
            .map_err(|e| sftp_error(e, "readdir", dir))?;
        let mut entries: Vec<(String, RemoteKind)> = raw
            .into_iter()
            .filter_map(|(entry_path, stat)| {
                let name = entry_path.file_name()?.to_string_lossy().into_owned();
                if name == "." || name == ".." {
                    return None;
                }
                Some((name, RemoteKind::from_mode(stat.perm)))
            })
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }
}

/// Recursive traversal below `root` (the root itself is not reported).
///
/// Directories are reported before their contents are visited.
pub fn walktree<R: DirReader + ?Sized>(
    reader: &R,
    root: &str,
    on_file: &mut dyn FnMut(&str),
    on_dir: &mut dyn FnMut(&str),
    on_unknown: &mut dyn FnMut(&str),
) -> FsResult<()> {
    for (name, kind) in reader.read_dir(root)? {
        let full = path::join(root, &name);
        match kind {
            RemoteKind::Directory => {
                on_dir(&full);
                walktree(reader, &full, on_file, on_dir, on_unknown)?;
            }
            RemoteKind::File => on_file(&full),
            RemoteKind::Other => on_unknown(&full),
        }
    }
    Ok(())
}

/// Walk `root` and regroup the results into top-down tree entries.
///
/// Symlinks and special files are skipped.
pub fn collect_tree<R: DirReader + ?Sized>(reader: &R, root: &str) -> FsResult<Vec<TreeEntry>> {
    let mut dirs = Vec::new();
    let mut files = Vec::new();
    walktree(
        reader,
        root,
        &mut |f| files.push(f.to_string()),
        &mut |d| dirs.push(d.to_string()),
        &mut |u| log::debug!("Skipping non-regular entry '{}'", u),
    )?;
    log::trace!(
        "Walked '{}': {} directories, {} files",
        root,
        dirs.len(),
        files.len()
    );
    Ok(rebuild_tree(root, dirs, files))
}
