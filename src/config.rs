//! Application configuration.
//!
//! Read once from a JSON file, then overlaid with environment variables.
//! After [`AppConfig::load`] returns the configuration is read-only.

use crate::error::{AppError, AppResult};
use csync_backup::BackupSettings;
use csync_core::{EngineDescriptor, EngineKind};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const CONFIG_ENV: &str = "CLUBSYNC_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "clubsync.json";

/// On-disk shape. Engine sections are keyed by name, case-insensitively.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    #[serde(default = "default_engine")]
    file_engine: String,
    #[serde(default)]
    engines: BTreeMap<String, EngineDescriptor>,
    #[serde(default)]
    backup: BackupSettings,
}

fn default_engine() -> String {
    "FTP".into()
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Active engine name as configured. Checked when first used.
    pub file_engine: String,
    pub engines: BTreeMap<EngineKind, EngineDescriptor>,
    pub backup: BackupSettings,
}

impl AppConfig {
    /// Load `path`, apply the process environment and validate.
    pub fn load(path: &Path) -> AppResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_json(&text)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse without environment overlay or validation.
    pub fn from_json(text: &str) -> AppResult<Self> {
        let file: ConfigFile = serde_json::from_str(text)
            .map_err(|e| AppError::Config(format!("malformed configuration: {}", e)))?;
        let mut engines = BTreeMap::new();
        for (name, descriptor) in file.engines {
            let kind = EngineKind::from_str(&name).map_err(|_| {
                AppError::Config(format!("unknown engine section '{}'", name))
            })?;
            engines.insert(kind, descriptor);
        }
        Ok(Self {
            file_engine: file.file_engine,
            engines,
            backup: file.backup,
        })
    }

    /// Overlay `FILE_ENGINE`, `<KIND>_SERVER_*`, `<KIND>_WHITELIST_PATH`,
    /// `LOCAL_SERVER_DIR`, `SFTP_HOSTKEY_CHECK` and `BACKUP_DESTINATION`.
    ///
    /// A descriptor is created for a kind as soon as one of its variables
    /// is set.
    pub fn apply_env<F>(&mut self, var: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(engine) = var("FILE_ENGINE") {
            self.file_engine = engine;
        }

        for kind in EngineKind::ALL {
            let prefix = kind.name();
            let get = |suffix: &str| var(&format!("{}_{}", prefix, suffix));

            let address = get("SERVER_ADDRESS");
            let port = get("SERVER_PORT");
            let username = get("SERVER_USERNAME");
            let password = get("SERVER_PASSWORD");
            let whitelist = get("WHITELIST_PATH");
            let dir = if kind == EngineKind::Local {
                get("SERVER_DIR")
            } else {
                None
            };
            let hostkey = if kind == EngineKind::Sftp {
                get("HOSTKEY_CHECK")
            } else {
                None
            };

            let touched = [&address, &port, &username, &password, &whitelist, &dir, &hostkey]
                .iter()
                .any(|v| v.is_some());
            if !touched {
                continue;
            }

            let d = self.engines.entry(kind).or_default();
            if let Some(v) = address {
                d.address = v;
            }
            if let Some(v) = port {
                let port = v.trim().parse::<u16>().map_err(|_| {
                    AppError::Config(format!("{}_SERVER_PORT is not a port: '{}'", prefix, v))
                })?;
                d.port = Some(port);
            }
            if let Some(v) = username {
                d.username = v;
            }
            if let Some(v) = password {
                d.password = v;
            }
            if let Some(v) = whitelist {
                d.whitelist_path = v;
            }
            if let Some(v) = dir {
                d.root = Some(v);
            }
            if let Some(v) = hostkey {
                d.hostkey_check = parse_flag(&v).ok_or_else(|| {
                    AppError::Config(format!("SFTP_HOSTKEY_CHECK is not a boolean: '{}'", v))
                })?;
            }
        }

        if let Some(dest) = var("BACKUP_DESTINATION") {
            self.backup.destination = PathBuf::from(dest);
        }
        Ok(())
    }

    /// Checks that do not depend on which engine is active.
    pub fn validate(&self) -> AppResult<()> {
        self.backup
            .validate()
            .map_err(|e| AppError::Config(e.message))?;

        for (kind, d) in &self.engines {
            match kind {
                EngineKind::Local => {
                    if d.root.as_deref().map_or(true, str::is_empty) {
                        return Err(AppError::Config(
                            "LOCAL engine requires a root directory".into(),
                        ));
                    }
                }
                remote => {
                    if d.address.is_empty() {
                        return Err(AppError::Config(format!(
                            "{} engine requires an address",
                            remote
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

fn parse_flag(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// `--config`, else `CLUBSYNC_CONFIG`, else `clubsync.json`.
pub fn config_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}
