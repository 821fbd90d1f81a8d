//! FTP and FTPS file engines.

use crate::ftp::client::FtpClient;
use crate::ftp::error::FtpError;
use crate::ftp::types::FtpConfig;
use async_trait::async_trait;
use csync_core::{
    copy_tree, CopyStats, DirListing, EngineDescriptor, EngineKind, FileEngine, FsError,
    FsResult, Session, TreeWalk,
};
use std::collections::BTreeSet;
use std::path::Path;

/// Engine for plain FTP or explicit FTPS, depending on `kind`.
pub struct FtpEngine {
    kind: EngineKind,
    descriptor: EngineDescriptor,
}

impl FtpEngine {
    pub fn new(kind: EngineKind, descriptor: EngineDescriptor) -> FsResult<Self> {
        match kind {
            EngineKind::Ftp | EngineKind::Ftps => Ok(Self { kind, descriptor }),
            other => Err(FsError::configuration(format!(
                "{} is not an FTP engine kind",
                other
            ))),
        }
    }

    pub fn ftp(descriptor: EngineDescriptor) -> Self {
        Self {
            kind: EngineKind::Ftp,
            descriptor,
        }
    }

    pub fn ftps(descriptor: EngineDescriptor) -> Self {
        Self {
            kind: EngineKind::Ftps,
            descriptor,
        }
    }

    pub fn config(&self) -> FtpConfig {
        FtpConfig::from_descriptor(self.kind, &self.descriptor)
    }

    /// Connect without boxing, for callers that want the concrete session.
    pub async fn connect(&self) -> FsResult<FtpSession> {
        let config = self.config();
        log::info!(
            "Opening {} session to {}:{} as '{}'",
            self.kind,
            config.host,
            config.port,
            config.username
        );
        let client = FtpClient::connect(config).await.map_err(FsError::from)?;
        Ok(FtpSession {
            kind: self.kind,
            client,
        })
    }
}

#[async_trait]
impl FileEngine for FtpEngine {
    fn kind(&self) -> EngineKind {
        self.kind
    }

    fn descriptor(&self) -> &EngineDescriptor {
        &self.descriptor
    }

    async fn get_session(&self) -> FsResult<Box<dyn Session>> {
        Ok(Box::new(self.connect().await?))
    }
}

/// One logged-in FTP/FTPS control connection.
pub struct FtpSession {
    kind: EngineKind,
    client: FtpClient,
}

impl FtpSession {
    pub fn client(&mut self) -> &mut FtpClient {
        &mut self.client
    }
}

fn at(path: &str) -> impl FnOnce(FtpError) -> FsError + '_ {
    move |e| FsError::from(e).with_path(path)
}

#[async_trait]
impl Session for FtpSession {
    fn kind(&self) -> EngineKind {
        self.kind
    }

    async fn write_text(&mut self, path: &str, text: &str) -> FsResult<()> {
        self.client
            .store_bytes(path, text.as_bytes())
            .await
            .map_err(at(path))
    }

    async fn read_text(&mut self, path: &str) -> FsResult<String> {
        let bytes = self.client.read_bytes(path).await.map_err(at(path))?;
        String::from_utf8(bytes).map_err(|e| {
            FsError::protocol(format!("Remote file is not valid UTF-8: {}", e)).with_path(path)
        })
    }

    async fn listdir(&mut self, path: &str) -> FsResult<BTreeSet<String>> {
        self.client.names(path).await.map_err(at(path))
    }

    async fn scan_dir(&mut self, path: &str) -> FsResult<DirListing> {
        self.client.scan(path).await.map_err(at(path))
    }

    async fn walk(&mut self, path: &str) -> FsResult<TreeWalk> {
        Ok(TreeWalk::descend(path))
    }

    async fn fetch_file(&mut self, path: &str, local: &Path) -> FsResult<u64> {
        self.client.download(path, local).await.map_err(at(path))
    }

    async fn copy_directory(&mut self, source: &str, destination: &Path) -> FsResult<CopyStats> {
        copy_tree(self, source, destination).await
    }

    async fn close(&mut self) -> FsResult<()> {
        self.client.quit().await.map_err(FsError::from)
    }
}
