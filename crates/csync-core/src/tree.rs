//! Tree walking.
//!
//! Every engine hands out the same [`TreeWalk`] shape: a sequence of
//! [`TreeEntry`] values, one per directory, parents before children.
//! Engines that can list a single directory walk by descending lazily
//! (one `scan_dir` per step). Engines whose transport only offers a
//! callback-driven recursive traversal collect the flat results and
//! rebuild the grouping with [`rebuild_tree`].

use crate::engine::Session;
use crate::error::FsResult;
use crate::path;
use crate::types::TreeEntry;
use log::warn;
use std::collections::HashMap;

/// Immediate children of one directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirListing {
    pub dirs: Vec<String>,
    pub files: Vec<String>,
}

impl DirListing {
    /// Sort both lists so walks are deterministic.
    pub fn sorted(mut self) -> Self {
        self.dirs.sort();
        self.files.sort();
        self
    }
}

/// A restartable, finite walk over one subtree.
pub struct TreeWalk {
    state: WalkState,
}

enum WalkState {
    /// Directories still to be listed, next one on top.
    Descend { pending: Vec<String> },
    /// Entries rebuilt up front from a callback traversal.
    Rebuilt(std::vec::IntoIter<TreeEntry>),
}

impl TreeWalk {
    /// Walk that lists one directory per step through `Session::scan_dir`.
    pub fn descend(root: impl Into<String>) -> Self {
        Self {
            state: WalkState::Descend {
                pending: vec![root.into()],
            },
        }
    }

    /// Walk over entries that are already grouped.
    pub fn from_entries(entries: Vec<TreeEntry>) -> Self {
        Self {
            state: WalkState::Rebuilt(entries.into_iter()),
        }
    }

    /// Produce the next entry, or `None` when the subtree is exhausted.
    ///
    /// A failed listing ends the walk after the error is returned.
    pub async fn next(&mut self, session: &mut dyn Session) -> Option<FsResult<TreeEntry>> {
        match &mut self.state {
            WalkState::Rebuilt(entries) => entries.next().map(Ok),
            WalkState::Descend { pending } => {
                let dir = pending.pop()?;
                match session.scan_dir(&dir).await {
                    Ok(listing) => {
                        for sub in listing.dirs.iter().rev() {
                            pending.push(path::join(&dir, sub));
                        }
                        Some(Ok(TreeEntry::new(dir, listing.dirs, listing.files)))
                    }
                    Err(e) => {
                        pending.clear();
                        Some(Err(e))
                    }
                }
            }
        }
    }

    /// Drain the walk into a vector.
    pub async fn collect(mut self, session: &mut dyn Session) -> FsResult<Vec<TreeEntry>> {
        let mut out = Vec::new();
        while let Some(entry) = self.next(session).await {
            out.push(entry?);
        }
        Ok(out)
    }
}

/// Regroup the flat output of a callback traversal into tree entries.
///
/// `dirs` and `files` are every directory and file path found below
/// `root`, in discovery order. Directories are ordered by depth
/// (stable), so each parent is emitted before any of its children, and
/// a root without children still yields one empty entry.
pub fn rebuild_tree(root: &str, dirs: Vec<String>, files: Vec<String>) -> Vec<TreeEntry> {
    let root_key = path::normalize(root);

    let mut found: Vec<String> = Vec::with_capacity(dirs.len() + 1);
    found.push(root_key.clone());
    found.extend(dirs.iter().map(|d| path::normalize(d)));
    found.sort_by_key(|d| path::depth(d));

    let mut index: HashMap<String, usize> = HashMap::with_capacity(found.len());
    let mut order: Vec<String> = Vec::with_capacity(found.len());
    for dir in found {
        if !index.contains_key(&dir) {
            index.insert(dir.clone(), order.len());
            order.push(dir);
        }
    }

    let mut listings = vec![DirListing::default(); order.len()];

    for dir in order.iter().filter(|d| **d != root_key) {
        match index.get(&path::parent(dir)) {
            Some(&slot) => listings[slot].dirs.push(path::file_name(dir).to_string()),
            None => warn!("Directory '{}' found outside walk root '{}'", dir, root),
        }
    }

    for file in &files {
        let file = path::normalize(file);
        match index.get(&path::parent(&file)) {
            Some(&slot) => listings[slot].files.push(path::file_name(&file).to_string()),
            None => warn!("File '{}' has no discovered parent directory", file),
        }
    }

    order
        .into_iter()
        .zip(listings)
        .enumerate()
        .map(|(i, (dir, listing))| {
            let shown = if i == 0 { root.to_string() } else { dir };
            TreeEntry::new(shown, listing.dirs, listing.files)
        })
        .collect()
}
