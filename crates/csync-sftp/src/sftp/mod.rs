// ── csync-sftp / sftp module ─────────────────────────────────────────────────
//
// SFTP backend for the file-engine abstraction:
//   • Session set-up over ssh2 (password / keyboard-interactive auth)
//   • Host-key verification against an OpenSSH known_hosts file
//   • The callback-driven recursive walk and its regrouping into tree entries
//   • Text read/write, listings and file download

pub mod connection;
pub mod engine;
pub mod error;
pub mod file_ops;
pub mod types;
pub mod walk;

pub use types::*;
