//! Golden path against a live OpenSSH server.
//!
//! Run with `--features docker-e2e` and point `SFTP_E2E_ADDRESS`,
//! `SFTP_E2E_PORT`, `SFTP_E2E_USERNAME` and `SFTP_E2E_PASSWORD` at a
//! writable account. Host-key checking is disabled for the container.
#![cfg(feature = "docker-e2e")]

use csync_core::{EngineDescriptor, FileEngine};
use csync_sftp::SftpEngine;

fn descriptor() -> EngineDescriptor {
    let var = |k: &str, d: &str| std::env::var(k).unwrap_or_else(|_| d.to_string());
    EngineDescriptor {
        address: var("SFTP_E2E_ADDRESS", "127.0.0.1"),
        port: var("SFTP_E2E_PORT", "2222").parse().ok(),
        username: var("SFTP_E2E_USERNAME", "test"),
        password: var("SFTP_E2E_PASSWORD", "test"),
        hostkey_check: false,
        ..Default::default()
    }
}

#[tokio::test]
async fn write_read_walk_and_copy() {
    let engine = SftpEngine::new(descriptor());
    let mut session = engine.get_session().await.unwrap();

    session.write_text("e2e.json", "[]").await.unwrap();
    assert_eq!(session.read_text("e2e.json").await.unwrap(), "[]");
    assert!(session.listdir(".").await.unwrap().contains("e2e.json"));

    let entries = session.walk(".").await.unwrap().collect(session.as_mut()).await.unwrap();
    assert!(entries[0].files.iter().any(|f| f == "e2e.json"));

    let tmp = tempfile::tempdir().unwrap();
    let stats = session.copy_directory(".", tmp.path()).await;
    // "." has no name to keep, so the copy is refused.
    assert!(stats.is_err());

    session.close().await.unwrap();
    session.close().await.unwrap();
}
