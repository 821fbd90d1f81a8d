//! SFTP file engine.
//!
//! Each operation opens its own SFTP channel on the session's single SSH
//! connection. libssh2 calls are blocking.

use crate::sftp::connection;
use crate::sftp::error::connect_error;
use crate::sftp::file_ops;
use crate::sftp::types::SftpConfig;
use crate::sftp::walk::collect_tree;
use async_trait::async_trait;
use csync_core::{
    copy_tree, path, CopyStats, DirListing, EngineDescriptor, EngineKind, FileEngine, FsError,
    FsResult, Session, TreeEntry, TreeWalk,
};
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::net::TcpStream;
use std::path::Path;

pub struct SftpEngine {
    descriptor: EngineDescriptor,
}

impl SftpEngine {
    pub fn new(descriptor: EngineDescriptor) -> Self {
        Self { descriptor }
    }

    pub fn config(&self) -> SftpConfig {
        SftpConfig::from_descriptor(&self.descriptor)
    }

    pub fn connect(&self) -> FsResult<SftpSession> {
        let config = self.config();
        let (session, tcp) = connection::connect(&config)?;
        Ok(SftpSession {
            session,
            _tcp: tcp,
            root: config.root.clone(),
            addr: config.addr(),
            closed: false,
        })
    }
}

#[async_trait]
impl FileEngine for SftpEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Sftp
    }

    fn descriptor(&self) -> &EngineDescriptor {
        &self.descriptor
    }

    async fn get_session(&self) -> FsResult<Box<dyn Session>> {
        Ok(Box::new(self.connect()?))
    }
}

/// One authenticated SSH connection.
pub struct SftpSession {
    session: ssh2::Session,
    _tcp: TcpStream, // keeps the socket open for the session's lifetime
    root: Option<String>,
    addr: String,
    closed: bool,
}

impl SftpSession {
    /// Resolve a caller path against the configured root.
    pub fn resolve(&self, p: &str) -> String {
        match &self.root {
            Some(root) => path::join(root, p),
            None => p.to_string(),
        }
    }

    fn channel(&self) -> FsResult<ssh2::Sftp> {
        if self.closed {
            return Err(FsError::connection(format!(
                "SFTP session to {} is closed",
                self.addr
            )));
        }
        self.session
            .sftp()
            .map_err(|e| connect_error(e, "SFTP channel", &self.addr))
    }

    /// Rewrite walk entries rooted at `resolved` so they read as paths
    /// under the caller's `requested` spelling.
    fn rebase(&self, requested: &str, resolved: &str, entries: Vec<TreeEntry>) -> Vec<TreeEntry> {
        if requested == resolved {
            return entries;
        }
        entries
            .into_iter()
            .map(|mut entry| {
                let rebased = path::strip_base(&entry.root, resolved).map(|rel| {
                    if rel.is_empty() {
                        requested.to_string()
                    } else {
                        path::join(requested, &rel.join("/"))
                    }
                });
                if let Some(root) = rebased {
                    entry.root = root;
                }
                entry
            })
            .collect()
    }

    fn disconnect(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        match self.session.disconnect(None, "closing", None) {
            Ok(()) => info!("SFTP session to {} closed", self.addr),
            Err(e) => warn!("SFTP disconnect from {} failed: {}", self.addr, e),
        }
    }
}

#[async_trait]
impl Session for SftpSession {
    fn kind(&self) -> EngineKind {
        EngineKind::Sftp
    }

    async fn write_text(&mut self, p: &str, text: &str) -> FsResult<()> {
        let target = self.resolve(p);
        file_ops::write_bytes(&self.channel()?, &target, text.as_bytes())
    }

    async fn read_text(&mut self, p: &str) -> FsResult<String> {
        let target = self.resolve(p);
        let bytes = file_ops::read_bytes(&self.channel()?, &target)?;
        String::from_utf8(bytes).map_err(|e| {
            FsError::protocol(format!("Remote file is not valid UTF-8: {}", e)).with_path(p)
        })
    }

    async fn listdir(&mut self, p: &str) -> FsResult<BTreeSet<String>> {
        let target = self.resolve(p);
        file_ops::names(&self.channel()?, &target)
    }

    async fn scan_dir(&mut self, p: &str) -> FsResult<DirListing> {
        let target = self.resolve(p);
        file_ops::scan(&self.channel()?, &target)
    }

    async fn walk(&mut self, p: &str) -> FsResult<TreeWalk> {
        let target = self.resolve(p);
        let entries = collect_tree(&self.channel()?, &target)?;
        debug!("SFTP walk of '{}' produced {} entries", target, entries.len());
        Ok(TreeWalk::from_entries(self.rebase(p, &target, entries)))
    }

    async fn fetch_file(&mut self, p: &str, local: &Path) -> FsResult<u64> {
        let target = self.resolve(p);
        file_ops::download(&self.channel()?, &target, local)
    }

    async fn copy_directory(&mut self, source: &str, destination: &Path) -> FsResult<CopyStats> {
        copy_tree(self, source, destination).await
    }

    async fn close(&mut self) -> FsResult<()> {
        self.disconnect();
        Ok(())
    }
}

impl Drop for SftpSession {
    fn drop(&mut self) {
        self.disconnect();
    }
}
