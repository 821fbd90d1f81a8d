//! File-level operations: RETR and STOR.

use crate::ftp::client::FtpClient;
use crate::ftp::error::FtpResult;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

impl FtpClient {
    /// Download a remote file into memory.
    pub async fn read_bytes(&mut self, remote_path: &str) -> FtpResult<Vec<u8>> {
        self.retrieve_data(&format!("RETR {}", remote_path), remote_path)
            .await
    }

    /// Create or overwrite a remote file.
    pub async fn store_bytes(&mut self, remote_path: &str, data: &[u8]) -> FtpResult<()> {
        self.send_data(&format!("STOR {}", remote_path), remote_path, data)
            .await?;
        log::debug!("Stored {} bytes at '{}'", data.len(), remote_path);
        Ok(())
    }

    /// Download a remote file to a local path, overwriting it.
    pub async fn download(&mut self, remote_path: &str, local_path: &Path) -> FtpResult<u64> {
        if let Some(parent) = local_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let mut file = fs::File::create(local_path).await?;
        let n = match self
            .retrieve_into(&format!("RETR {}", remote_path), remote_path, &mut file)
            .await
        {
            Ok(n) => n,
            Err(e) => {
                drop(file);
                if let Err(rm) = fs::remove_file(local_path).await {
                    log::debug!("Could not remove partial {}: {}", local_path.display(), rm);
                }
                return Err(e);
            }
        };
        file.flush().await?;
        log::trace!("RETR {} -> {} ({} bytes)", remote_path, local_path.display(), n);
        Ok(n)
    }
}
