// ── SFTP types ───────────────────────────────────────────────────────────────

use csync_core::{EngineDescriptor, EngineKind};
use std::fmt;
use std::path::PathBuf;

/// Connection parameters for one SFTP session.
#[derive(Clone)]
pub struct SftpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Base directory relative paths are resolved against.
    pub root: Option<String>,
    pub hostkey_check: bool,
    pub known_hosts_path: Option<PathBuf>,
}

impl SftpConfig {
    pub fn from_descriptor(d: &EngineDescriptor) -> Self {
        Self {
            host: d.address.clone(),
            port: d.port_for(EngineKind::Sftp),
            username: d.username.clone(),
            password: d.password.clone(),
            root: d.root.clone().filter(|r| !r.is_empty()),
            hostkey_check: d.hostkey_check,
            known_hosts_path: d.known_hosts_path.as_ref().map(PathBuf::from),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The explicit known_hosts file, or `~/.ssh/known_hosts`.
    pub fn resolved_known_hosts(&self) -> Option<PathBuf> {
        self.known_hosts_path
            .clone()
            .or_else(|| dirs::home_dir().map(|h| h.join(".ssh").join("known_hosts")))
    }
}

impl fmt::Debug for SftpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SftpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("root", &self.root)
            .field("hostkey_check", &self.hostkey_check)
            .field("known_hosts_path", &self.known_hosts_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_defaults() {
        let cfg = SftpConfig::from_descriptor(&EngineDescriptor {
            address: "mc.example.org".into(),
            password: "secret".into(),
            ..Default::default()
        });
        assert_eq!(cfg.port, 22);
        assert!(cfg.hostkey_check);
        assert_eq!(cfg.addr(), "mc.example.org:22");
        assert!(!format!("{:?}", cfg).contains("secret"));
    }

    #[test]
    fn explicit_known_hosts_wins() {
        let cfg = SftpConfig::from_descriptor(&EngineDescriptor {
            known_hosts_path: Some("/etc/ssh/ssh_known_hosts".into()),
            ..Default::default()
        });
        assert_eq!(
            cfg.resolved_known_hosts(),
            Some(PathBuf::from("/etc/ssh/ssh_known_hosts"))
        );
    }
}
