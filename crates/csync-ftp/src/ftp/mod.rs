//! # csync-ftp: FTP/FTPS client and engines
//!
//! Implements the subset of FTP the file engines need (RFC 959) with:
//! - **RFC 2228 / 4217**: explicit FTPS (`AUTH TLS`, `PBSZ 0`, `PROT P`)
//! - **RFC 3659**: MLSD listings, SIZE
//! - **RFC 2389**: FEAT negotiation
//! - **RFC 2428**: EPSV
//!
//! Architecture:
//! - `types`: configuration, replies, listing entries, feature flags
//! - `error`: FTP-specific error type and its mapping into `FsError`
//! - `protocol`: low-level command/response codec
//! - `connection`: TCP control connection
//! - `tls`: rustls client configuration and TLS upgrade
//! - `transfer`: data channel (PASV/EPSV), optionally TLS-wrapped
//! - `client`: stateful client: login, FEAT, TYPE, CWD, listings
//! - `parser`: MLSD / Unix / Windows listing parsing
//! - `directory`: directory scans
//! - `file_ops`: RETR / STOR
//! - `engine`: the `FileEngine` / `Session` implementations

pub mod client;
pub mod connection;
pub mod directory;
pub mod engine;
pub mod error;
pub mod file_ops;
pub mod parser;
pub mod protocol;
pub mod tls;
pub mod transfer;
pub mod types;

pub use client::FtpClient;
pub use error::{FtpError, FtpErrorKind, FtpResult};
pub use types::*;
