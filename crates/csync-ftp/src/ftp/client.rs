//! Stateful FTP client: owns the control connection and issues commands.
//!
//! Lifecycle: `connect()` → optional explicit TLS upgrade → authenticate
//! → FEAT probing → `TYPE I` → optionally `CWD` into the configured root.
//!
//! Low-level helpers here are used by `directory.rs` and `file_ops.rs`.

use crate::ftp::connection;
use crate::ftp::error::{FtpError, FtpErrorKind, FtpResult};
use crate::ftp::parser;
use crate::ftp::protocol::FtpCodec;
use crate::ftp::tls;
use crate::ftp::transfer::{DataChannel, DataStream};
use crate::ftp::types::*;
use tokio::io::AsyncWrite;

/// A connected, logged-in FTP client.
pub struct FtpClient {
    pub codec: FtpCodec,
    pub config: FtpConfig,
    pub features: ServerFeatures,
    data: DataChannel,
    connected: bool,
}

impl FtpClient {
    /// Establish a new FTP session.
    pub async fn connect(config: FtpConfig) -> FtpResult<Self> {
        if config.host.is_empty() {
            return Err(FtpError::invalid_config("Host must not be empty"));
        }

        let (mut codec, banner, peer) = connection::connect(&config).await?;
        log::debug!(
            "Connected to {}:{}: {}",
            config.host,
            config.port,
            banner.lines.last().map(String::as_str).unwrap_or("")
        );

        // ── Explicit FTPS: AUTH TLS ──────────────────────────────
        let tls_config = if config.is_secure() {
            let tls_config = tls::build_client_config(config.accept_invalid_certs)?;
            let resp = codec.execute("AUTH TLS").await?;
            if !resp.is_completion() {
                return Err(FtpError::tls_failed(format!(
                    "AUTH TLS rejected: {}",
                    resp.text()
                ))
                .with_code(resp.code));
            }
            codec = tls::upgrade_to_tls(codec, &config.host, tls_config.clone()).await?;
            codec.expect_ok("PBSZ 0").await?;
            codec.expect_ok("PROT P").await?;
            Some(tls_config)
        } else {
            None
        };

        Self::login(&mut codec, &config).await?;

        let features = Self::probe_features(&mut codec).await?;
        if config.utf8 && features.utf8 {
            let resp = codec.execute("OPTS UTF8 ON").await?;
            if !resp.is_completion() {
                log::debug!("OPTS UTF8 ON refused: {}", resp.text());
            }
        }

        codec.expect_ok("TYPE I").await?;

        if let Some(ref root) = config.root {
            codec
                .expect_ok(&format!("CWD {}", root))
                .await
                .map_err(|e| {
                    FtpError::invalid_config(format!(
                        "Cannot enter root directory '{}': {}",
                        root, e.message
                    ))
                })?;
        }

        let data = DataChannel {
            mode: config.data_channel_mode,
            peer,
            host: config.host.clone(),
            tls: tls_config,
        };

        Ok(Self {
            codec,
            config,
            features,
            data,
            connected: true,
        })
    }

    async fn login(codec: &mut FtpCodec, config: &FtpConfig) -> FtpResult<()> {
        let user_resp = codec.execute(&format!("USER {}", config.username)).await?;
        if user_resp.code == 331 {
            let pass_resp = codec.execute(&format!("PASS {}", config.password)).await?;
            if !pass_resp.is_completion() {
                return Err(FtpError::auth_failed(format!(
                    "Login failed: {}",
                    pass_resp.text()
                ))
                .with_code(pass_resp.code));
            }
        } else if !user_resp.is_completion() {
            return Err(FtpError::auth_failed(format!(
                "USER rejected: {}",
                user_resp.text()
            ))
            .with_code(user_resp.code));
        }
        log::debug!("Logged in as '{}'", config.username);
        Ok(())
    }

    // ─── FEAT probe ──────────────────────────────────────────────

    /// A server without FEAT support yields the default (empty) feature set.
    async fn probe_features(codec: &mut FtpCodec) -> FtpResult<ServerFeatures> {
        let resp = codec.execute("FEAT").await?;
        if !resp.is_completion() {
            return Ok(ServerFeatures::default());
        }

        Ok(ServerFeatures::from_reply(&resp))
    }

    // ─── Data transfers ──────────────────────────────────────────

    /// Issue a data command (`RETR`, `MLSD`, `LIST`, `STOR`) after opening
    /// the data connection, and check the preliminary reply.
    ///
    /// Returns whether the final reply is still outstanding.
    async fn start_transfer(&mut self, cmd: &str, path: &str) -> FtpResult<(DataStream, bool)> {
        let tcp = self.data.connect(&mut self.codec).await?;
        let resp = self.codec.execute(cmd).await?;
        let pending = if resp.is_preliminary() {
            true
        } else if resp.is_completion() {
            false
        } else {
            return Err(FtpError::from_path_reply(resp.code, &resp.text(), path));
        };
        let ds = self.data.secure(tcp).await?;
        Ok((ds, pending))
    }

    async fn finish_transfer(&mut self, pending: bool, path: &str) -> FtpResult<()> {
        if !pending {
            return Ok(());
        }
        let done = self.codec.read_response().await?;
        if !done.is_completion() {
            let mut err = FtpError::from_path_reply(done.code, &done.text(), path);
            if err.kind == FtpErrorKind::CommandRejected {
                err.kind = FtpErrorKind::TransferFailed;
            }
            return Err(err);
        }
        Ok(())
    }

    /// Run a data command and collect the whole payload.
    pub async fn retrieve_data(&mut self, cmd: &str, path: &str) -> FtpResult<Vec<u8>> {
        let (ds, pending) = self.start_transfer(cmd, path).await?;
        let data = ds.read_all().await?;
        self.finish_transfer(pending, path).await?;
        Ok(data)
    }

    /// Run a data command and stream the payload into `sink`.
    pub async fn retrieve_into<W: AsyncWrite + Unpin>(
        &mut self,
        cmd: &str,
        path: &str,
        sink: &mut W,
    ) -> FtpResult<u64> {
        let (ds, pending) = self.start_transfer(cmd, path).await?;
        let n = ds.copy_into(sink).await?;
        self.finish_transfer(pending, path).await?;
        Ok(n)
    }

    /// Run a data command that uploads `data`.
    pub async fn send_data(&mut self, cmd: &str, path: &str, data: &[u8]) -> FtpResult<()> {
        let (ds, pending) = self.start_transfer(cmd, path).await?;
        ds.write_all_and_close(data).await?;
        self.finish_transfer(pending, path).await
    }

    // ─── Listing ─────────────────────────────────────────────────

    /// Directory listing, MLSD when advertised, LIST otherwise.
    pub async fn list(&mut self, path: &str) -> FtpResult<Vec<FtpEntry>> {
        let verb = if self.features.mlsd { "MLSD" } else { "LIST" };
        let cmd = format!("{} {}", verb, path);
        let raw = self.retrieve_data(&cmd, path).await?;
        let text = String::from_utf8_lossy(&raw);
        Ok(parser::parse_listing(&text))
    }

    // ─── QUIT ────────────────────────────────────────────────────

    /// Gracefully close the session. Safe to call more than once.
    pub async fn quit(&mut self) -> FtpResult<()> {
        if !self.connected {
            return Ok(());
        }
        self.connected = false;
        match self.codec.execute("QUIT").await {
            Ok(resp) => log::debug!("QUIT: {}", resp.text()),
            Err(e) => log::debug!("QUIT failed, dropping connection: {}", e),
        }
        Ok(())
    }
}
