//! Golden path against a live FTP/FTPS server.
//!
//! Run with `--features docker-e2e`. `FTP_E2E_ADDRESS`, `FTP_E2E_PORT`,
//! `FTP_E2E_USERNAME` and `FTP_E2E_PASSWORD` select the account; set
//! `FTP_E2E_TLS=1` to exercise explicit FTPS with a self-signed cert.
#![cfg(feature = "docker-e2e")]

use csync_core::{EngineDescriptor, EngineKind, FileEngine};
use csync_ftp::FtpEngine;

fn engine() -> FtpEngine {
    let var = |k: &str, d: &str| std::env::var(k).unwrap_or_else(|_| d.to_string());
    let kind = if var("FTP_E2E_TLS", "0") == "1" {
        EngineKind::Ftps
    } else {
        EngineKind::Ftp
    };
    FtpEngine::new(
        kind,
        EngineDescriptor {
            address: var("FTP_E2E_ADDRESS", "127.0.0.1"),
            port: var("FTP_E2E_PORT", "21").parse().ok(),
            username: var("FTP_E2E_USERNAME", "test"),
            password: var("FTP_E2E_PASSWORD", "test"),
            accept_invalid_certs: true,
            ..Default::default()
        },
    )
    .unwrap()
}

#[tokio::test]
async fn write_read_and_list() {
    let mut session = engine().get_session().await.unwrap();

    session.write_text("e2e.json", "[{\"name\":\"Steve\"}]").await.unwrap();
    assert_eq!(
        session.read_text("e2e.json").await.unwrap(),
        "[{\"name\":\"Steve\"}]"
    );
    assert!(session.listdir(".").await.unwrap().contains("e2e.json"));

    let listing = session.scan_dir(".").await.unwrap();
    assert!(listing.files.iter().any(|f| f == "e2e.json"));

    session.close().await.unwrap();
}
