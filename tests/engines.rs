mod support;

use clubsync::{AppConfig, FileManager};
use csync_core::{EngineDescriptor, FileEngine, FsErrorKind, Session};
use csync_ftp::FtpEngine;
use support::{MemTree, ScriptedFtp};

fn world() -> MemTree {
    let mut tree = MemTree::default();
    tree.file("world/level.dat", "level")
        .file("world/region/r.0.0.mca", "region-data")
        .dir("world/data")
        .file("server.properties", "motd=hi");
    tree
}

#[tokio::test]
async fn ftp_session_round_trip() {
    let server = ScriptedFtp::start(world()).await;
    let engine = FtpEngine::ftp(server.descriptor());
    let mut session = engine.get_session().await.unwrap();

    session.write_text("motd.txt", "welcome").await.unwrap();
    assert_eq!(server.file("motd.txt").as_deref(), Some("welcome"));
    assert_eq!(session.read_text("motd.txt").await.unwrap(), "welcome");

    let names = session.listdir(".").await.unwrap();
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    assert_eq!(names, vec!["motd.txt", "server.properties", "world"]);

    session.close().await.unwrap();
    session.close().await.unwrap();
    assert_eq!(server.count("QUIT"), 1);
}

#[tokio::test]
async fn ftp_walk_is_top_down() {
    let server = ScriptedFtp::start(world()).await;
    let engine = FtpEngine::ftp(server.descriptor());
    let mut session = engine.get_session().await.unwrap();

    let walk = session.walk("world").await.unwrap();
    let entries = walk.collect(session.as_mut()).await.unwrap();
    let roots: Vec<&str> = entries.iter().map(|e| e.root.as_str()).collect();
    assert_eq!(roots, vec!["world", "world/data", "world/region"]);
    assert_eq!(entries[0].dirs, vec!["data".to_string(), "region".to_string()]);
    assert_eq!(entries[0].files, vec!["level.dat".to_string()]);
    assert!(entries[1].files.is_empty());
    assert_eq!(entries[2].files, vec!["r.0.0.mca".to_string()]);
    session.close().await.unwrap();
}

#[tokio::test]
async fn ftp_copy_keeps_source_name() {
    let server = ScriptedFtp::start(world()).await;
    let dst = tempfile::tempdir().unwrap();
    let engine = FtpEngine::ftp(server.descriptor());
    let mut session = engine.get_session().await.unwrap();

    let stats = session.copy_directory("world", dst.path()).await.unwrap();
    session.close().await.unwrap();

    assert_eq!(stats.files_copied, 2);
    assert_eq!(stats.bytes_copied, ("level".len() + "region-data".len()) as u64);
    assert_eq!(stats.directories_created, 3);
    let copied = dst.path().join("world");
    assert_eq!(std::fs::read_to_string(copied.join("level.dat")).unwrap(), "level");
    assert_eq!(
        std::fs::read_to_string(copied.join("region/r.0.0.mca")).unwrap(),
        "region-data"
    );
    assert!(copied.join("data").is_dir());
}

#[tokio::test]
async fn list_fallback_and_extended_passive() {
    let server = ScriptedFtp::start_list_only(world()).await;
    let engine = FtpEngine::ftp(EngineDescriptor {
        extended_passive: true,
        ..server.descriptor()
    });
    let mut session = engine.get_session().await.unwrap();

    let listing = session.scan_dir("world").await.unwrap();
    assert_eq!(listing.dirs, vec!["data".to_string(), "region".to_string()]);
    assert_eq!(listing.files, vec!["level.dat".to_string()]);
    session.close().await.unwrap();

    assert!(server.count("LIST") >= 1);
    assert_eq!(server.count("MLSD"), 0);
    assert_eq!(server.count("PASV"), 0);
    assert!(server.count("EPSV") >= 1);
}

#[tokio::test]
async fn configured_root_prefixes_paths() {
    let mut tree = MemTree::default();
    tree.dir("server");
    let server = ScriptedFtp::start(tree).await;
    let engine = FtpEngine::ftp(EngineDescriptor {
        root: Some("server".into()),
        ..server.descriptor()
    });
    let mut session = engine.get_session().await.unwrap();
    session.write_text("whitelist.json", "[]").await.unwrap();
    session.close().await.unwrap();

    assert_eq!(server.file("server/whitelist.json").as_deref(), Some("[]"));
    assert!(server.commands().contains(&"CWD server".to_string()));
}

#[tokio::test]
async fn missing_root_is_configuration_error() {
    let server = ScriptedFtp::start(MemTree::default()).await;
    let engine = FtpEngine::ftp(EngineDescriptor {
        root: Some("nowhere".into()),
        ..server.descriptor()
    });
    let err = engine.get_session().await.err().unwrap();
    assert_eq!(err.kind, FsErrorKind::Configuration);
}

#[tokio::test]
async fn missing_file_is_not_found() {
    let server = ScriptedFtp::start(world()).await;
    let engine = FtpEngine::ftp(server.descriptor());
    let mut session = engine.get_session().await.unwrap();

    let err = session.read_text("ops.json").await.unwrap_err();
    assert_eq!(err.kind, FsErrorKind::NotFound);
    assert_eq!(err.path.as_deref(), Some("ops.json"));

    // The control connection stays usable after a refused transfer.
    assert_eq!(session.read_text("server.properties").await.unwrap(), "motd=hi");
    session.close().await.unwrap();
}

#[tokio::test]
async fn wrong_password_is_connection_error() {
    let server = ScriptedFtp::start(world()).await;
    let engine = FtpEngine::ftp(EngineDescriptor {
        password: "hunter2".into(),
        ..server.descriptor()
    });
    let err = engine.get_session().await.err().unwrap();
    assert_eq!(err.kind, FsErrorKind::Connection);
}

fn ftp_config(server: &ScriptedFtp) -> AppConfig {
    let json = format!(
        r#"{{"fileEngine": "ftp",
            "engines": {{"FTP": {{"address": "127.0.0.1", "port": {},
                                  "username": "{}", "password": "{}"}}}}}}"#,
        server.port(),
        support::USERNAME,
        support::PASSWORD
    );
    AppConfig::from_json(&json).unwrap()
}

#[tokio::test]
async fn file_manager_closes_every_session() {
    let server = ScriptedFtp::start(world()).await;
    let fm = FileManager::from_config(&ftp_config(&server)).unwrap();

    assert_eq!(fm.read_text("server.properties").await.unwrap(), "motd=hi");
    assert!(fm.read_text("missing.txt").await.is_err());
    assert_eq!(fm.walk("world").await.unwrap().len(), 3);

    assert_eq!(server.count("USER"), 3);
    assert_eq!(server.count("QUIT"), 3);
}
