pub mod ftp;

pub use ftp::engine::{FtpEngine, FtpSession};
pub use ftp::{FtpClient, FtpConfig, FtpError, FtpErrorKind, FtpResult};
