//! clubsync: keeps a game server's whitelist in step with the club's
//! membership records and takes rotating snapshot backups of its worlds,
//! over FTP, FTPS, SFTP or a local directory.

pub mod commands;
pub mod config;
pub mod error;
pub mod registry;
pub mod whitelist;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use registry::{EngineRegistry, FileManager};
pub use whitelist::{WhitelistEntry, WhitelistRecord};
