//! Shared types: engine identity, connection descriptors, tree entries.

use crate::error::FsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ─── Engine identity ────────────────────────────────────────────────

/// The four supported backend kinds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum EngineKind {
    /// Plain-text FTP.
    Ftp,
    /// FTP with explicit TLS on control and data channels.
    Ftps,
    /// SFTP over SSH.
    Sftp,
    /// A directory on the local machine.
    Local,
}

impl EngineKind {
    pub const ALL: [EngineKind; 4] = [
        EngineKind::Ftp,
        EngineKind::Ftps,
        EngineKind::Sftp,
        EngineKind::Local,
    ];

    /// Configuration name, also the prefix of the engine's env variables.
    pub fn name(self) -> &'static str {
        match self {
            EngineKind::Ftp => "FTP",
            EngineKind::Ftps => "FTPS",
            EngineKind::Sftp => "SFTP",
            EngineKind::Local => "LOCAL",
        }
    }

    pub fn default_port(self) -> u16 {
        match self {
            EngineKind::Ftp | EngineKind::Ftps => 21,
            EngineKind::Sftp => 22,
            EngineKind::Local => 0,
        }
    }

    pub fn is_remote(self) -> bool {
        self != EngineKind::Local
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EngineKind {
    type Err = FsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        EngineKind::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| FsError::configuration(format!("Unknown file engine '{}'", s)))
    }
}

// ─── Engine descriptor ──────────────────────────────────────────────

/// Connection parameters for one backend, loaded once at startup.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineDescriptor {
    #[serde(default)]
    pub address: String,
    /// Falls back to the kind's well-known port.
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Base directory every relative path is resolved against.
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default = "default_whitelist_path")]
    pub whitelist_path: String,
    /// SFTP only. Disabling skips host-key verification entirely.
    #[serde(default = "default_true")]
    pub hostkey_check: bool,
    /// SFTP only. Defaults to `~/.ssh/known_hosts`.
    #[serde(default)]
    pub known_hosts_path: Option<String>,
    /// FTPS only. Accept self-signed / untrusted server certificates.
    #[serde(default)]
    pub accept_invalid_certs: bool,
    /// FTP/FTPS only. Use EPSV instead of PASV for data connections.
    #[serde(default)]
    pub extended_passive: bool,
}

fn default_whitelist_path() -> String {
    "whitelist.json".into()
}
fn default_true() -> bool {
    true
}

impl Default for EngineDescriptor {
    fn default() -> Self {
        Self {
            address: String::new(),
            port: None,
            username: String::new(),
            password: String::new(),
            root: None,
            whitelist_path: default_whitelist_path(),
            hostkey_check: true,
            known_hosts_path: None,
            accept_invalid_certs: false,
            extended_passive: false,
        }
    }
}

impl EngineDescriptor {
    pub fn port_for(&self, kind: EngineKind) -> u16 {
        self.port.unwrap_or_else(|| kind.default_port())
    }
}

impl fmt::Debug for EngineDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineDescriptor")
            .field("address", &self.address)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("root", &self.root)
            .field("whitelist_path", &self.whitelist_path)
            .field("hostkey_check", &self.hostkey_check)
            .field("known_hosts_path", &self.known_hosts_path)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .field("extended_passive", &self.extended_passive)
            .finish()
    }
}

// ─── Tree entries ───────────────────────────────────────────────────

/// One directory's direct children, the unit produced by a walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeEntry {
    pub root: String,
    pub dirs: Vec<String>,
    pub files: Vec<String>,
}

impl TreeEntry {
    pub fn new(root: impl Into<String>, dirs: Vec<String>, files: Vec<String>) -> Self {
        Self {
            root: root.into(),
            dirs,
            files,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_names_parse_case_insensitively() {
        assert_eq!("sftp".parse::<EngineKind>().unwrap(), EngineKind::Sftp);
        assert_eq!(" FTPS ".parse::<EngineKind>().unwrap(), EngineKind::Ftps);
        assert_eq!("Local".parse::<EngineKind>().unwrap(), EngineKind::Local);
    }

    #[test]
    fn unknown_engine_is_configuration_error() {
        let err = "SMB".parse::<EngineKind>().unwrap_err();
        assert_eq!(err.kind, crate::FsErrorKind::Configuration);
    }

    #[test]
    fn descriptor_debug_masks_password() {
        let d = EngineDescriptor {
            password: "hunter2".into(),
            ..Default::default()
        };
        let dbg = format!("{:?}", d);
        assert!(!dbg.contains("hunter2"));
    }

    #[test]
    fn port_defaults_per_kind() {
        let d = EngineDescriptor::default();
        assert_eq!(d.port_for(EngineKind::Sftp), 22);
        assert_eq!(d.port_for(EngineKind::Ftps), 21);
    }
}
