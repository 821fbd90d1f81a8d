//! Engine-independent error type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Categorised filesystem/transport error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FsError {
    pub kind: FsErrorKind,
    pub message: String,
    /// Path the failing operation targeted, if any.
    pub path: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FsErrorKind {
    /// Missing/invalid setting or unknown engine name.
    Configuration,
    /// Unreachable host, rejected credentials, TLS or host-key failure.
    Connection,
    /// Remote or local path does not exist.
    NotFound,
    /// Transfer broke off mid-way (remote side).
    Transfer,
    /// Server reply or payload could not be understood.
    Protocol,
    /// Target already exists and must not be merged into.
    AlreadyExists,
    /// Local filesystem failure.
    Io,
}

pub type FsResult<T> = Result<T, FsError>;

impl FsError {
    pub fn new(kind: FsErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::new(FsErrorKind::Configuration, msg)
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        Self::new(FsErrorKind::Connection, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(FsErrorKind::NotFound, msg)
    }

    pub fn transfer(msg: impl Into<String>) -> Self {
        Self::new(FsErrorKind::Transfer, msg)
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::new(FsErrorKind::Protocol, msg)
    }

    pub fn already_exists(msg: impl Into<String>) -> Self {
        Self::new(FsErrorKind::AlreadyExists, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(FsErrorKind::Io, msg)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == FsErrorKind::NotFound
    }

    /// Wrap a local I/O error, keeping `NotFound`/`AlreadyExists` distinct.
    pub fn from_io(err: std::io::Error, path: impl AsRef<std::path::Path>) -> Self {
        let path = path.as_ref().display().to_string();
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => FsErrorKind::NotFound,
            std::io::ErrorKind::AlreadyExists => FsErrorKind::AlreadyExists,
            _ => FsErrorKind::Io,
        };
        Self::new(kind, format!("{}: {}", path, err)).with_path(path)
    }
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "[{:?}] {} ({})", self.kind, self.message, path),
            None => write!(f, "[{:?}] {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for FsError {}

impl From<std::io::Error> for FsError {
    fn from(e: std::io::Error) -> Self {
        let kind = match e.kind() {
            std::io::ErrorKind::NotFound => FsErrorKind::NotFound,
            std::io::ErrorKind::AlreadyExists => FsErrorKind::AlreadyExists,
            _ => FsErrorKind::Io,
        };
        Self::new(kind, e.to_string())
    }
}
