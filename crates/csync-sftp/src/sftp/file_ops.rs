// ── File operations over an open SFTP channel ────────────────────────────────

use crate::sftp::error::{sftp_error, stream_error};
use crate::sftp::walk::{DirReader, RemoteKind};
use csync_core::{DirListing, FsError, FsResult};
use std::collections::BTreeSet;
use std::io::{Read, Write};
use std::path::Path;

/// Read a whole remote file.
pub fn read_bytes(sftp: &ssh2::Sftp, path: &str) -> FsResult<Vec<u8>> {
    let mut file = sftp
        .open(Path::new(path))
        .map_err(|e| sftp_error(e, "open", path))?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)
        .map_err(|e| stream_error(e, "read", path))?;
    Ok(buf)
}

/// Create or truncate a remote file and write `data` to it.
pub fn write_bytes(sftp: &ssh2::Sftp, path: &str, data: &[u8]) -> FsResult<()> {
    let mut file = sftp
        .create(Path::new(path))
        .map_err(|e| sftp_error(e, "create", path))?;
    file.write_all(data)
        .map_err(|e| stream_error(e, "write", path))?;
    Ok(())
}

/// Copy a remote file to a local path, overwriting it.
pub fn download(sftp: &ssh2::Sftp, remote: &str, local: &Path) -> FsResult<u64> {
    let mut source = sftp
        .open(Path::new(remote))
        .map_err(|e| sftp_error(e, "open", remote))?;
    if let Some(parent) = local.parent() {
        std::fs::create_dir_all(parent).map_err(|e| FsError::from_io(e, parent))?;
    }
    let mut target = std::fs::File::create(local).map_err(|e| FsError::from_io(e, local))?;

    let mut chunk = vec![0u8; 64 * 1024];
    let mut total = 0u64;
    loop {
        let n = source
            .read(&mut chunk)
            .map_err(|e| stream_error(e, "read", remote))?;
        if n == 0 {
            break;
        }
        target
            .write_all(&chunk[..n])
            .map_err(|e| FsError::from_io(e, local))?;
        total += n as u64;
    }
    target.flush().map_err(|e| FsError::from_io(e, local))?;
    Ok(total)
}

/// Names of all children of `dir`.
pub fn names<R: DirReader + ?Sized>(reader: &R, dir: &str) -> FsResult<BTreeSet<String>> {
    Ok(reader.read_dir(dir)?.into_iter().map(|(n, _)| n).collect())
}

/// Children of `dir` split into directories and regular files.
pub fn scan<R: DirReader + ?Sized>(reader: &R, dir: &str) -> FsResult<DirListing> {
    let mut listing = DirListing::default();
    for (name, kind) in reader.read_dir(dir)? {
        match kind {
            RemoteKind::Directory => listing.dirs.push(name),
            RemoteKind::File => listing.files.push(name),
            RemoteKind::Other => {}
        }
    }
    Ok(listing.sorted())
}
