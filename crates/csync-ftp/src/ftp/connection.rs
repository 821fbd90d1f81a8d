//! TCP transport: establishes the FTP control connection.
//!
//! No connect timeout is applied here; callers that need one wrap the
//! session future in `tokio::time::timeout`.

use crate::ftp::error::{FtpError, FtpResult};
use crate::ftp::protocol::FtpCodec;
use crate::ftp::types::{FtpConfig, FtpResponse};
use std::net::IpAddr;
use tokio::net::TcpStream;

/// Open the control connection and read the welcome banner.
///
/// Returns the codec, the banner, and the server's IP address, which
/// data connections reuse. Explicit FTPS upgrades later (`client.rs`).
pub async fn connect(config: &FtpConfig) -> FtpResult<(FtpCodec, FtpResponse, IpAddr)> {
    let addr = format!("{}:{}", config.host, config.port);

    let tcp = TcpStream::connect(&addr)
        .await
        .map_err(|e| FtpError::connection_failed(format!("TCP connect to {}: {}", addr, e)))?;
    tcp.set_nodelay(true).ok();
    let peer = tcp
        .peer_addr()
        .map_err(|e| FtpError::connection_failed(format!("Peer address of {}: {}", addr, e)))?
        .ip();

    let mut codec = FtpCodec::from_tcp(tcp);
    let banner = codec.read_response().await?;
    if !banner.is_completion() {
        return Err(FtpError::connection_failed(format!(
            "Server refused connection: {}",
            banner.text()
        ))
        .with_code(banner.code));
    }
    Ok((codec, banner, peer))
}
