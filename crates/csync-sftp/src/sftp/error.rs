// ── ssh2 → FsError mapping ───────────────────────────────────────────────────

use csync_core::{FsError, FsErrorKind};
use ssh2::ErrorCode;

// libssh2 SFTP status codes.
const FX_NO_SUCH_FILE: i32 = 2;
const FX_PERMISSION_DENIED: i32 = 3;
const FX_NO_SUCH_PATH: i32 = 10;
const FX_FILE_ALREADY_EXISTS: i32 = 11;

/// Classify an ssh2 error raised while operating on `path`.
pub fn sftp_error(err: ssh2::Error, op: &str, path: &str) -> FsError {
    let kind = match err.code() {
        ErrorCode::SFTP(FX_NO_SUCH_FILE) | ErrorCode::SFTP(FX_NO_SUCH_PATH) => FsErrorKind::NotFound,
        ErrorCode::SFTP(FX_FILE_ALREADY_EXISTS) => FsErrorKind::AlreadyExists,
        ErrorCode::SFTP(FX_PERMISSION_DENIED) | ErrorCode::SFTP(_) => FsErrorKind::Transfer,
        ErrorCode::Session(_) => FsErrorKind::Transfer,
    };
    FsError::new(kind, format!("{} '{}' failed: {}", op, path, err)).with_path(path)
}

/// An I/O error on an open remote file handle.
pub fn stream_error(err: std::io::Error, op: &str, path: &str) -> FsError {
    FsError::transfer(format!("{} '{}' failed: {}", op, path, err)).with_path(path)
}

/// Failure while establishing the session.
pub fn connect_error(err: ssh2::Error, step: &str, addr: &str) -> FsError {
    FsError::connection(format!("{} with {} failed: {}", step, addr, err))
}
