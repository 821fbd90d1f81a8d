//! The uniform capability set every backend implements.
//!
//! A [`FileEngine`] knows how to open connections; a [`Session`] is one
//! live connection and carries the actual file operations. Paths handed
//! to a session are relative to the engine's configured root, while
//! copy destinations are always on the local machine.

use crate::error::{FsError, FsResult};
use crate::path;
use crate::tree::{DirListing, TreeWalk};
use crate::types::{EngineDescriptor, EngineKind};
use async_trait::async_trait;
use log::debug;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// A backend able to open [`Session`]s from its descriptor.
#[async_trait]
pub trait FileEngine: Send + Sync {
    fn kind(&self) -> EngineKind;

    fn descriptor(&self) -> &EngineDescriptor;

    /// Open a fresh connection. Every call yields a new, unshared session.
    async fn get_session(&self) -> FsResult<Box<dyn Session>>;
}

/// One live connection to a backend.
///
/// Dropping a session releases the transport; [`Session::close`] does
/// so gracefully and may be called more than once. After any error the
/// session should be considered unusable.
#[async_trait]
pub trait Session: Send {
    fn kind(&self) -> EngineKind;

    /// Create or overwrite a UTF-8 text file. Not atomic.
    async fn write_text(&mut self, path: &str, text: &str) -> FsResult<()>;

    async fn read_text(&mut self, path: &str) -> FsResult<String>;

    /// Names of the immediate children of `path`, files and directories mixed.
    async fn listdir(&mut self, path: &str) -> FsResult<BTreeSet<String>>;

    /// Immediate children of `path`, split into directories and files.
    async fn scan_dir(&mut self, path: &str) -> FsResult<DirListing>;

    /// Start a top-down walk of the subtree rooted at `path`.
    async fn walk(&mut self, path: &str) -> FsResult<TreeWalk>;

    /// Copy one remote file to a local path, returning the byte count.
    async fn fetch_file(&mut self, path: &str, local: &Path) -> FsResult<u64>;

    /// Recursively copy `source` into the local directory `destination`,
    /// keeping the last component of `source` as a child of it.
    async fn copy_directory(&mut self, source: &str, destination: &Path) -> FsResult<CopyStats>;

    async fn close(&mut self) -> FsResult<()>;
}

/// Counters reported by a directory copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyStats {
    pub directories_created: u64,
    pub files_copied: u64,
    pub bytes_copied: u64,
}

impl CopyStats {
    pub fn absorb(&mut self, other: CopyStats) {
        self.directories_created += other.directories_created;
        self.files_copied += other.files_copied;
        self.bytes_copied += other.bytes_copied;
    }
}

/// Walk-driven recursive copy shared by the remote engines.
///
/// `source/x/y` lands at `destination/<name of source>/x/y`. Directories
/// are created on first use and reused if present; files are overwritten.
pub async fn copy_tree(
    session: &mut dyn Session,
    source: &str,
    destination: &Path,
) -> FsResult<CopyStats> {
    if path::file_name(source).is_empty() {
        return Err(FsError::configuration(format!(
            "Cannot copy '{}': source must name a directory",
            source
        )));
    }
    let base = path::parent(source);
    let mut stats = CopyStats::default();
    let mut walk = session.walk(source).await?;

    while let Some(entry) = walk.next(session).await {
        let entry = entry?;
        let relative = path::strip_base(&entry.root, &base).ok_or_else(|| {
            FsError::protocol(format!(
                "Walk produced '{}' outside of '{}'",
                entry.root, base
            ))
        })?;
        let dest_dir: PathBuf = relative.iter().fold(destination.to_path_buf(), |acc, c| acc.join(c));

        if ensure_local_dir(&dest_dir)? {
            stats.directories_created += 1;
        }

        for file in &entry.files {
            let remote = path::join(&entry.root, file);
            let bytes = session.fetch_file(&remote, &dest_dir.join(file)).await?;
            stats.files_copied += 1;
            stats.bytes_copied += bytes;
        }
    }

    debug!(
        "Copied '{}' into {}: {} files, {} bytes",
        source,
        destination.display(),
        stats.files_copied,
        stats.bytes_copied
    );
    Ok(stats)
}

/// Create `dir` unless it exists. Returns whether it was created.
pub fn ensure_local_dir(dir: &Path) -> FsResult<bool> {
    if dir.is_dir() {
        return Ok(false);
    }
    match std::fs::create_dir(dir) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(FsError::from_io(e, dir)),
    }
}
