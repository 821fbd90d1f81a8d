// ── SSH session set-up ───────────────────────────────────────────────────────

use crate::sftp::error::connect_error;
use crate::sftp::types::SftpConfig;
use csync_core::{FsError, FsResult};
use log::{info, warn};
use ssh2::{CheckResult, KnownHostFileKind, Session};
use std::net::TcpStream;

/// Open TCP, run the SSH handshake, verify the host key and log in.
///
/// Calls are blocking; no connect timeout is applied.
pub fn connect(config: &SftpConfig) -> FsResult<(Session, TcpStream)> {
    if config.host.is_empty() {
        return Err(FsError::configuration("SFTP server address must not be empty"));
    }
    let addr = config.addr();
    info!("SFTP connecting to {}", addr);

    let tcp = TcpStream::connect(&addr)
        .map_err(|e| FsError::connection(format!("TCP connection to {} failed: {}", addr, e)))?;

    let mut session = Session::new().map_err(|e| connect_error(e, "SSH session setup", &addr))?;
    let stream = tcp
        .try_clone()
        .map_err(|e| FsError::connection(format!("Cannot clone socket for {}: {}", addr, e)))?;
    session.set_tcp_stream(stream);
    session
        .handshake()
        .map_err(|e| connect_error(e, "SSH handshake", &addr))?;

    verify_host_key(&session, config)?;
    authenticate(&session, config)?;

    info!("SFTP authenticated to {} as '{}'", addr, config.username);
    Ok((session, tcp))
}

fn verify_host_key(session: &Session, config: &SftpConfig) -> FsResult<()> {
    let addr = config.addr();
    if !config.hostkey_check {
        warn!(
            "Host-key verification is DISABLED for {}; the connection is open to interception",
            addr
        );
        return Ok(());
    }

    let (key, _) = session
        .host_key()
        .ok_or_else(|| FsError::connection(format!("{} presented no host key", addr)))?;

    let known_hosts_path = config.resolved_known_hosts().ok_or_else(|| {
        FsError::connection("Cannot locate a known_hosts file (no home directory)")
    })?;

    let mut known = session
        .known_hosts()
        .map_err(|e| connect_error(e, "Known-hosts setup", &addr))?;
    known
        .read_file(&known_hosts_path, KnownHostFileKind::OpenSSH)
        .map_err(|e| {
            FsError::connection(format!(
                "Cannot read known hosts file {}: {}",
                known_hosts_path.display(),
                e
            ))
        })?;

    match known.check_port(&config.host, config.port, key) {
        CheckResult::Match => Ok(()),
        CheckResult::NotFound => Err(FsError::connection(format!(
            "Host key for {} not found in {}",
            addr,
            known_hosts_path.display()
        ))),
        CheckResult::Mismatch => Err(FsError::connection(format!(
            "Host key for {} does not match {}: possible man-in-the-middle",
            addr,
            known_hosts_path.display()
        ))),
        CheckResult::Failure => Err(FsError::connection(format!(
            "Host key check for {} failed",
            addr
        ))),
    }
}

struct PasswordPrompt<'a> {
    password: &'a str,
}

impl ssh2::KeyboardInteractivePrompt for PasswordPrompt<'_> {
    fn prompt(
        &mut self,
        _username: &str,
        _instructions: &str,
        prompts: &[ssh2::Prompt],
    ) -> Vec<String> {
        prompts.iter().map(|_| self.password.to_string()).collect()
    }
}

/// Password auth, falling back to keyboard-interactive.
fn authenticate(session: &Session, config: &SftpConfig) -> FsResult<()> {
    if session
        .userauth_password(&config.username, &config.password)
        .is_ok()
        && session.authenticated()
    {
        return Ok(());
    }

    let mut prompt = PasswordPrompt {
        password: &config.password,
    };
    match session.userauth_keyboard_interactive(&config.username, &mut prompt) {
        Ok(()) if session.authenticated() => Ok(()),
        Ok(()) => Err(FsError::connection(format!(
            "Authentication failed for '{}' at {}",
            config.username,
            config.addr()
        ))),
        Err(e) => Err(connect_error(e, "Authentication", &config.addr())),
    }
}
