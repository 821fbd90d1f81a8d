//! LOCAL file engine.

use crate::local::copy::copy_local_tree;
use async_trait::async_trait;
use csync_core::{
    CopyStats, DirListing, EngineDescriptor, EngineKind, FileEngine, FsError, FsResult, Session,
    TreeWalk,
};
use log::{debug, info};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Engine over a base directory on this machine.
pub struct LocalEngine {
    descriptor: EngineDescriptor,
    root: PathBuf,
}

impl LocalEngine {
    /// The descriptor must carry a non-empty `root`.
    pub fn new(descriptor: EngineDescriptor) -> FsResult<Self> {
        let root = descriptor
            .root
            .clone()
            .filter(|r| !r.is_empty())
            .ok_or_else(|| FsError::configuration("LOCAL engine requires a root directory"))?;
        Ok(Self {
            root: PathBuf::from(root),
            descriptor,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn open(&self) -> LocalSession {
        debug!("Opening LOCAL session at {}", self.root.display());
        LocalSession {
            root: self.root.clone(),
        }
    }
}

#[async_trait]
impl FileEngine for LocalEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Local
    }

    fn descriptor(&self) -> &EngineDescriptor {
        &self.descriptor
    }

    async fn get_session(&self) -> FsResult<Box<dyn Session>> {
        Ok(Box::new(self.open()))
    }
}

/// Scoped handle over the base directory. Holds no resources.
pub struct LocalSession {
    root: PathBuf,
}

impl LocalSession {
    /// Map a session path onto the filesystem. Absolute paths are used as is.
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

#[async_trait]
impl Session for LocalSession {
    fn kind(&self) -> EngineKind {
        EngineKind::Local
    }

    async fn write_text(&mut self, path: &str, text: &str) -> FsResult<()> {
        let target = self.resolve(path);
        tokio::fs::write(&target, text)
            .await
            .map_err(|e| FsError::from_io(e, &target))
    }

    async fn read_text(&mut self, path: &str) -> FsResult<String> {
        let target = self.resolve(path);
        let bytes = tokio::fs::read(&target)
            .await
            .map_err(|e| FsError::from_io(e, &target))?;
        String::from_utf8(bytes).map_err(|e| {
            FsError::protocol(format!("File is not valid UTF-8: {}", e)).with_path(path)
        })
    }

    async fn listdir(&mut self, path: &str) -> FsResult<BTreeSet<String>> {
        let target = self.resolve(path);
        let mut names = BTreeSet::new();
        let mut rd = tokio::fs::read_dir(&target)
            .await
            .map_err(|e| FsError::from_io(e, &target))?;
        while let Some(entry) = rd
            .next_entry()
            .await
            .map_err(|e| FsError::from_io(e, &target))?
        {
            names.insert(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    async fn scan_dir(&mut self, path: &str) -> FsResult<DirListing> {
        let target = self.resolve(path);
        let mut listing = DirListing::default();
        let mut rd = tokio::fs::read_dir(&target)
            .await
            .map_err(|e| FsError::from_io(e, &target))?;
        while let Some(entry) = rd
            .next_entry()
            .await
            .map_err(|e| FsError::from_io(e, &target))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| FsError::from_io(e, entry.path()))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if file_type.is_dir() {
                listing.dirs.push(name);
            } else if file_type.is_file() {
                listing.files.push(name);
            }
        }
        Ok(listing.sorted())
    }

    async fn walk(&mut self, path: &str) -> FsResult<TreeWalk> {
        Ok(TreeWalk::descend(path))
    }

    async fn fetch_file(&mut self, path: &str, local: &Path) -> FsResult<u64> {
        let source = self.resolve(path);
        if let Some(parent) = local.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| FsError::from_io(e, parent))?;
        }
        tokio::fs::copy(&source, local)
            .await
            .map_err(|e| FsError::from_io(e, &source))
    }

    async fn copy_directory(&mut self, source: &str, destination: &Path) -> FsResult<CopyStats> {
        let from = self.resolve(source);
        let stats = copy_local_tree(&from, destination)?;
        info!(
            "Copied {} into {}: {} files, {} bytes",
            from.display(),
            destination.display(),
            stats.files_copied,
            stats.bytes_copied
        );
        Ok(stats)
    }

    async fn close(&mut self) -> FsResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csync_core::{FsErrorKind, TreeEntry};
    use std::fs;

    fn engine(root: &Path) -> LocalEngine {
        LocalEngine::new(EngineDescriptor {
            root: Some(root.to_string_lossy().into_owned()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn root_is_required() {
        let err = LocalEngine::new(EngineDescriptor::default()).err().unwrap();
        assert_eq!(err.kind, FsErrorKind::Configuration);
    }

    #[tokio::test]
    async fn text_round_trip_and_listing() {
        let tmp = tempfile::tempdir().unwrap();
        let mut session = engine(tmp.path()).get_session().await.unwrap();

        session.write_text("whitelist.json", "[]").await.unwrap();
        assert_eq!(session.read_text("whitelist.json").await.unwrap(), "[]");

        fs::create_dir(tmp.path().join("world")).unwrap();
        let names = session.listdir(".").await.unwrap();
        assert_eq!(
            names.into_iter().collect::<Vec<_>>(),
            vec!["whitelist.json".to_string(), "world".to_string()]
        );
        session.close().await.unwrap();
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let mut session = engine(tmp.path()).open();
        let err = session.read_text("absent.json").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn invalid_utf8_is_protocol_error() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("bin.dat"), [0xff, 0xfe, 0x00]).unwrap();
        let mut session = engine(tmp.path()).open();
        let err = session.read_text("bin.dat").await.unwrap_err();
        assert_eq!(err.kind, FsErrorKind::Protocol);
    }

    #[tokio::test]
    async fn walk_is_top_down_and_restartable() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("world/region")).unwrap();
        fs::create_dir_all(tmp.path().join("world/data")).unwrap();
        fs::write(tmp.path().join("world/level.dat"), "x").unwrap();
        fs::write(tmp.path().join("world/region/r.0.0.mca"), "y").unwrap();

        let mut session = engine(tmp.path()).open();
        let expected = vec![
            TreeEntry::new(
                "world",
                vec!["data".into(), "region".into()],
                vec!["level.dat".into()],
            ),
            TreeEntry::new("world/data", vec![], vec![]),
            TreeEntry::new("world/region", vec![], vec!["r.0.0.mca".into()]),
        ];
        for _ in 0..2 {
            let walk = session.walk("world").await.unwrap();
            assert_eq!(walk.collect(&mut session).await.unwrap(), expected);
        }
    }

    #[tokio::test]
    async fn copy_directory_keeps_source_name() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        fs::create_dir_all(src.path().join("srv/world")).unwrap();
        fs::write(src.path().join("srv/world/level.dat"), "level").unwrap();

        let mut session = engine(src.path()).open();
        let stats = session
            .copy_directory("srv/world", dst.path())
            .await
            .unwrap();
        assert_eq!(stats.files_copied, 1);
        assert!(dst.path().join("world/level.dat").is_file());
        assert!(!dst.path().join("srv").exists());
    }

    #[tokio::test]
    async fn fetch_file_creates_parents() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        fs::write(src.path().join("ops.json"), "[]").unwrap();

        let mut session = engine(src.path()).open();
        let local = dst.path().join("nested/ops.json");
        assert_eq!(session.fetch_file("ops.json", &local).await.unwrap(), 2);
        assert_eq!(fs::read_to_string(local).unwrap(), "[]");
    }
}
