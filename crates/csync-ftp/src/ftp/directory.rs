//! Directory listings in the shapes the engines consume.

use crate::ftp::client::FtpClient;
use crate::ftp::error::FtpResult;
use crate::ftp::types::FtpEntryKind;
use csync_core::DirListing;
use std::collections::BTreeSet;

impl FtpClient {
    /// Immediate children of `path`, split into directories and files.
    ///
    /// Symlinks and unrecognised entries are skipped: the walk does not
    /// follow links.
    pub async fn scan(&mut self, path: &str) -> FtpResult<DirListing> {
        let mut listing = DirListing::default();
        for entry in self.list(path).await? {
            match entry.kind {
                FtpEntryKind::Directory => listing.dirs.push(entry.name),
                FtpEntryKind::File => listing.files.push(entry.name),
                FtpEntryKind::Symlink | FtpEntryKind::Unknown => {
                    log::debug!("Skipping '{}' in '{}' ({:?})", entry.name, path, entry.kind)
                }
            }
        }
        Ok(listing.sorted())
    }

    /// Names of every child of `path`.
    pub async fn names(&mut self, path: &str) -> FtpResult<BTreeSet<String>> {
        Ok(self
            .list(path)
            .await?
            .into_iter()
            .map(|e| e.name)
            .collect())
    }
}
