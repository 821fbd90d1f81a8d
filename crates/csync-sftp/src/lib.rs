pub mod sftp;

pub use sftp::engine::{SftpEngine, SftpSession};
pub use sftp::types::SftpConfig;
pub use sftp::walk::{collect_tree, walktree, DirReader, RemoteKind};
