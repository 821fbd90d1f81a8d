//! Data-channel management for FTP transfers.
//!
//! Supports the two passive modes (RFC 959 + RFC 2428):
//! - **PASV**: `227 Entering Passive Mode (h1,h2,h3,h4,p1,p2)`
//! - **EPSV**: `229 Entering Extended Passive Mode (|||port|)`
//!
//! The data socket is always opened towards the control connection's
//! peer; the address inside a PASV reply is often a NAT-internal one.
//! For FTPS (`PROT P`) the socket is TLS-wrapped.

use crate::ftp::error::{FtpError, FtpResult};
use crate::ftp::protocol::FtpCodec;
use crate::ftp::tls;
use crate::ftp::types::DataChannelMode;
use lazy_static::lazy_static;
use regex::Regex;
use rustls::ClientConfig;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

lazy_static! {
    static ref PASV_RE: Regex =
        Regex::new(r"\((\d+),(\d+),(\d+),(\d+),(\d+),(\d+)\)").expect("valid PASV regex");
    static ref EPSV_RE: Regex = Regex::new(r"\|\|\|(\d+)\|").expect("valid EPSV regex");
}

/// A plain or TLS-wrapped data stream.
pub enum DataStream {
    Plain(TcpStream),
    Tls(Box<tokio_rustls::client::TlsStream<TcpStream>>),
}

/// Parameters for opening data connections, fixed for a session.
#[derive(Clone)]
pub struct DataChannel {
    pub mode: DataChannelMode,
    pub peer: IpAddr,
    pub host: String,
    /// Present when the data channel must be TLS-protected.
    pub tls: Option<Arc<ClientConfig>>,
}

impl DataChannel {
    /// Negotiate a passive port and open the TCP connection to it.
    pub async fn connect(&self, codec: &mut FtpCodec) -> FtpResult<TcpStream> {
        let port = match self.mode {
            DataChannelMode::Passive => {
                let resp = codec.expect_ok("PASV").await?;
                parse_pasv_response(&resp.text())?.port()
            }
            DataChannelMode::ExtendedPassive => {
                let resp = codec.expect_ok("EPSV").await?;
                parse_epsv_response(&resp.text())?
            }
        };

        let target = SocketAddr::new(self.peer, port);
        TcpStream::connect(target)
            .await
            .map_err(|e| FtpError::data_channel(format!("Data connect to {}: {}", target, e)))
    }

    /// Wrap the connection in TLS when required.
    ///
    /// Must run after the server accepted the transfer command: servers
    /// only start their side of the handshake at that point.
    pub async fn secure(&self, tcp: TcpStream) -> FtpResult<DataStream> {
        match &self.tls {
            Some(config) => {
                let tls = tls::wrap_data_stream(tcp, &self.host, config.clone()).await?;
                Ok(DataStream::Tls(Box::new(tls)))
            }
            None => Ok(DataStream::Plain(tcp)),
        }
    }
}

impl DataStream {
    /// Read until the server closes the data connection.
    pub async fn read_all(self) -> FtpResult<Vec<u8>> {
        let mut buf = Vec::new();
        match self {
            DataStream::Plain(mut tcp) => {
                tcp.read_to_end(&mut buf)
                    .await
                    .map_err(|e| FtpError::transfer_failed(format!("Data read: {}", e)))?;
            }
            DataStream::Tls(mut tls) => read_tls_to_end(&mut *tls, &mut buf).await?,
        }
        Ok(buf)
    }

    /// Copy the whole stream into `sink`, returning the byte count.
    pub async fn copy_into<W: AsyncWrite + Unpin>(self, sink: &mut W) -> FtpResult<u64> {
        let copied = match self {
            DataStream::Plain(mut tcp) => tokio::io::copy(&mut tcp, sink).await,
            DataStream::Tls(mut tls) => copy_tls(&mut *tls, sink).await,
        };
        copied.map_err(|e| FtpError::transfer_failed(format!("Data read: {}", e)))
    }

    /// Send `data` and close our side so the server sees end-of-file.
    pub async fn write_all_and_close(self, data: &[u8]) -> FtpResult<()> {
        let sent = match self {
            DataStream::Plain(mut tcp) => send_and_shutdown(&mut tcp, data).await,
            DataStream::Tls(mut tls) => send_and_shutdown(&mut *tls, data).await,
        };
        sent.map_err(|e| FtpError::transfer_failed(format!("Data write: {}", e)))
    }
}

async fn send_and_shutdown<S: AsyncWrite + Unpin>(stream: &mut S, data: &[u8]) -> std::io::Result<()> {
    stream.write_all(data).await?;
    stream.flush().await?;
    stream.shutdown().await
}

/// Some servers drop the TLS data connection without `close_notify`
/// once the payload is complete; treat that EOF as the end of data.
async fn read_tls_to_end<S: AsyncRead + Unpin>(stream: &mut S, buf: &mut Vec<u8>) -> FtpResult<()> {
    match stream.read_to_end(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            log::debug!("TLS data channel closed without close_notify");
            Ok(())
        }
        Err(e) => Err(FtpError::transfer_failed(format!("Data read: {}", e))),
    }
}

async fn copy_tls<S: AsyncRead + Unpin, W: AsyncWrite + Unpin>(
    stream: &mut S,
    sink: &mut W,
) -> std::io::Result<u64> {
    let mut chunk = vec![0u8; 64 * 1024];
    let mut total = 0u64;
    loop {
        let n = match stream.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                log::debug!("TLS data channel closed without close_notify");
                break;
            }
            Err(e) => return Err(e),
        };
        sink.write_all(&chunk[..n]).await?;
        total += n as u64;
    }
    Ok(total)
}

/// Parse `(h1,h2,h3,h4,p1,p2)` from a 227 response.
pub(crate) fn parse_pasv_response(text: &str) -> FtpResult<SocketAddr> {
    let caps = PASV_RE
        .captures(text)
        .ok_or_else(|| FtpError::protocol_error(format!("Cannot parse PASV: {}", text)))?;

    let nums = (1..=6)
        .map(|i| {
            caps[i]
                .parse::<u8>()
                .map_err(|_| FtpError::protocol_error("PASV number out of range"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let ip = IpAddr::from([nums[0], nums[1], nums[2], nums[3]]);
    let port = u16::from(nums[4]) * 256 + u16::from(nums[5]);
    Ok(SocketAddr::new(ip, port))
}

/// Parse `(|||port|)` from a 229 response.
pub(crate) fn parse_epsv_response(text: &str) -> FtpResult<u16> {
    let caps = EPSV_RE
        .captures(text)
        .ok_or_else(|| FtpError::protocol_error(format!("Cannot parse EPSV: {}", text)))?;
    caps[1]
        .parse::<u16>()
        .map_err(|_| FtpError::protocol_error("EPSV port out of range"))
}
