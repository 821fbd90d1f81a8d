//! Engine registry and the dispatcher that fronts it.

use crate::config::AppConfig;
use csync_core::{
    CopyStats, EngineDescriptor, EngineKind, FileEngine, FsError, FsResult, Session, TreeEntry,
};
use csync_ftp::FtpEngine;
use csync_local::LocalEngine;
use csync_sftp::SftpEngine;
use futures::future::BoxFuture;
use log::{debug, warn};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

type Constructor = fn(EngineDescriptor) -> FsResult<Arc<dyn FileEngine>>;

/// One constructor per backend kind.
const CONSTRUCTORS: [(EngineKind, Constructor); 4] = [
    (EngineKind::Ftp, build_ftp),
    (EngineKind::Ftps, build_ftps),
    (EngineKind::Sftp, build_sftp),
    (EngineKind::Local, build_local),
];

fn build_ftp(d: EngineDescriptor) -> FsResult<Arc<dyn FileEngine>> {
    Ok(Arc::new(FtpEngine::ftp(d)))
}

fn build_ftps(d: EngineDescriptor) -> FsResult<Arc<dyn FileEngine>> {
    Ok(Arc::new(FtpEngine::ftps(d)))
}

fn build_sftp(d: EngineDescriptor) -> FsResult<Arc<dyn FileEngine>> {
    Ok(Arc::new(SftpEngine::new(d)))
}

fn build_local(d: EngineDescriptor) -> FsResult<Arc<dyn FileEngine>> {
    Ok(Arc::new(LocalEngine::new(d)?))
}

/// Engines built from the configured descriptors.
#[derive(Default, Clone)]
pub struct EngineRegistry {
    engines: HashMap<EngineKind, Arc<dyn FileEngine>>,
}

impl EngineRegistry {
    pub fn from_config(config: &AppConfig) -> FsResult<Self> {
        let mut registry = Self::default();
        for (kind, build) in CONSTRUCTORS {
            if let Some(descriptor) = config.engines.get(&kind) {
                registry.register(kind, build(descriptor.clone())?);
            }
        }
        Ok(registry)
    }

    pub fn register(&mut self, kind: EngineKind, engine: Arc<dyn FileEngine>) {
        debug!("Registered {} engine", kind);
        self.engines.insert(kind, engine);
    }

    pub fn get(&self, kind: EngineKind) -> Option<Arc<dyn FileEngine>> {
        self.engines.get(&kind).cloned()
    }

    pub fn kinds(&self) -> Vec<EngineKind> {
        let mut kinds: Vec<_> = self.engines.keys().copied().collect();
        kinds.sort();
        kinds
    }
}

/// Forwards every operation to the engine named by the configuration.
///
/// Each operation opens its own session and closes it afterwards.
#[derive(Clone)]
pub struct FileManager {
    registry: EngineRegistry,
    active: String,
}

impl FileManager {
    pub fn new(registry: EngineRegistry, active: impl Into<String>) -> Self {
        Self {
            registry,
            active: active.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> FsResult<Self> {
        Ok(Self::new(
            EngineRegistry::from_config(config)?,
            config.file_engine.clone(),
        ))
    }

    pub fn active_name(&self) -> &str {
        &self.active
    }

    /// The active engine. Unknown or unregistered names are configuration errors.
    pub fn engine(&self) -> FsResult<Arc<dyn FileEngine>> {
        let kind: EngineKind = self.active.parse()?;
        self.registry.get(kind).ok_or_else(|| {
            FsError::configuration(format!(
                "File engine '{}' is not configured (configured: {:?})",
                self.active,
                self.registry.kinds()
            ))
        })
    }

    pub fn whitelist_path(&self) -> FsResult<String> {
        Ok(self.engine()?.descriptor().whitelist_path.clone())
    }

    pub async fn get_session(&self) -> FsResult<Box<dyn Session>> {
        self.engine()?.get_session().await
    }

    /// Open a session, run `f` on it and close it whatever `f` returned.
    pub async fn with_session<T, F>(&self, f: F) -> FsResult<T>
    where
        F: for<'s> FnOnce(&'s mut dyn Session) -> BoxFuture<'s, FsResult<T>>,
    {
        let mut session = self.get_session().await?;
        let result = f(session.as_mut()).await;
        if let Err(e) = session.close().await {
            warn!("Closing {} session failed: {}", session.kind(), e);
        }
        result
    }

    pub async fn read_text(&self, path: &str) -> FsResult<String> {
        let path = path.to_string();
        self.with_session(move |s| Box::pin(async move { s.read_text(&path).await }))
            .await
    }

    pub async fn write_text(&self, path: &str, text: &str) -> FsResult<()> {
        let (path, text) = (path.to_string(), text.to_string());
        self.with_session(move |s| Box::pin(async move { s.write_text(&path, &text).await }))
            .await
    }

    pub async fn listdir(&self, path: &str) -> FsResult<BTreeSet<String>> {
        let path = path.to_string();
        self.with_session(move |s| Box::pin(async move { s.listdir(&path).await }))
            .await
    }

    /// Walk `path` to completion.
    pub async fn walk(&self, path: &str) -> FsResult<Vec<TreeEntry>> {
        let path = path.to_string();
        self.with_session(move |s| {
            Box::pin(async move {
                let walk = s.walk(&path).await?;
                walk.collect(s).await
            })
        })
        .await
    }

    pub async fn copy_directory(&self, source: &str, destination: &Path) -> FsResult<CopyStats> {
        let source = source.to_string();
        let destination = destination.to_path_buf();
        self.with_session(move |s| {
            Box::pin(async move { s.copy_directory(&source, &destination).await })
        })
        .await
    }
}
