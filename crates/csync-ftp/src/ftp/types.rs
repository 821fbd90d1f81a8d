//! Data structures shared across the FTP modules.

use csync_core::{EngineDescriptor, EngineKind};
use serde::{Deserialize, Serialize};

// ─── Configuration ──────────────────────────────────────────────────

/// Control-channel security.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FtpSecurityMode {
    /// Plain FTP, everything in clear text.
    None,
    /// Explicit FTPS: connect plain, then `AUTH TLS`.
    Explicit,
}

/// How the data connection is opened.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum DataChannelMode {
    #[default]
    Passive,
    ExtendedPassive,
}

/// Everything needed to open one FTP session.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub security: FtpSecurityMode,
    #[serde(default)]
    pub data_channel_mode: DataChannelMode,
    /// Skip certificate validation (FTPS only).
    #[serde(default)]
    pub accept_invalid_certs: bool,
    /// Directory to `CWD` into after login.
    #[serde(default)]
    pub root: Option<String>,
    /// Send `OPTS UTF8 ON` when the server advertises UTF8.
    #[serde(default = "default_true")]
    pub utf8: bool,
}

fn default_true() -> bool {
    true
}

impl FtpConfig {
    /// Build the client configuration for an FTP or FTPS engine.
    pub fn from_descriptor(kind: EngineKind, d: &EngineDescriptor) -> Self {
        Self {
            host: d.address.clone(),
            port: d.port_for(kind),
            username: d.username.clone(),
            password: d.password.clone(),
            security: if kind == EngineKind::Ftps {
                FtpSecurityMode::Explicit
            } else {
                FtpSecurityMode::None
            },
            data_channel_mode: if d.extended_passive {
                DataChannelMode::ExtendedPassive
            } else {
                DataChannelMode::Passive
            },
            accept_invalid_certs: d.accept_invalid_certs,
            root: d.root.clone().filter(|r| !r.is_empty()),
            utf8: true,
        }
    }

    pub fn is_secure(&self) -> bool {
        self.security != FtpSecurityMode::None
    }
}

impl std::fmt::Debug for FtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("security", &self.security)
            .field("data_channel_mode", &self.data_channel_mode)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .field("root", &self.root)
            .finish()
    }
}

// ─── Replies ────────────────────────────────────────────────────────

/// A complete (possibly multi-line) server reply.
#[derive(Debug, Clone)]
pub struct FtpResponse {
    pub code: u16,
    pub lines: Vec<String>,
}

impl FtpResponse {
    /// Full response text (all lines joined).
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// 1xx.
    pub fn is_preliminary(&self) -> bool {
        (100..200).contains(&self.code)
    }

    /// 2xx.
    pub fn is_completion(&self) -> bool {
        (200..300).contains(&self.code)
    }
}

// ─── Listing entries ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FtpEntryKind {
    File,
    Directory,
    Symlink,
    Unknown,
}

/// One entry of a parsed LIST or MLSD listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FtpEntry {
    pub name: String,
    pub kind: FtpEntryKind,
}

impl FtpEntry {
    pub fn new(name: impl Into<String>, kind: FtpEntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

// ─── Server features ────────────────────────────────────────────────

/// Capabilities advertised in the `FEAT` reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerFeatures {
    /// MLSD (or MLST) listings are available.
    pub mlsd: bool,
    pub utf8: bool,
}

impl ServerFeatures {
    /// Read the feature lines of a `211` FEAT reply.
    pub fn from_reply(resp: &FtpResponse) -> Self {
        let raw: Vec<String> = resp
            .lines
            .iter()
            .skip(1)
            .filter(|l| !l.starts_with("211"))
            .map(|l| l.trim().to_uppercase())
            .collect();
        let has = |feat: &str| raw.iter().any(|l| l.starts_with(feat));
        Self {
            mlsd: has("MLSD") || has("MLST"),
            utf8: has("UTF8"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ftps_descriptor_enables_explicit_tls() {
        let d = EngineDescriptor {
            address: "mc.example.org".into(),
            root: Some(String::new()),
            extended_passive: true,
            ..Default::default()
        };
        let cfg = FtpConfig::from_descriptor(EngineKind::Ftps, &d);
        assert_eq!(cfg.security, FtpSecurityMode::Explicit);
        assert_eq!(cfg.port, 21);
        assert_eq!(cfg.data_channel_mode, DataChannelMode::ExtendedPassive);
        assert!(cfg.root.is_none());

        let plain = FtpConfig::from_descriptor(EngineKind::Ftp, &d);
        assert!(!plain.is_secure());
    }

    #[test]
    fn feat_reply_flags() {
        let resp = FtpResponse {
            code: 211,
            lines: vec![
                "211-Features:".into(),
                " mlst type*;size*;modify*;".into(),
                " UTF8".into(),
                " EPSV".into(),
                "211 End".into(),
            ],
        };
        let features = ServerFeatures::from_reply(&resp);
        assert!(features.mlsd);
        assert!(features.utf8);

        let bare = FtpResponse {
            code: 211,
            lines: vec!["211-Features:".into(), " SIZE".into(), "211 End".into()],
        };
        assert!(!ServerFeatures::from_reply(&bare).mlsd);
    }
}
