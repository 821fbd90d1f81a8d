//! Command entry points behind the `clubsync` binary.
//!
//! Each command takes the loaded configuration, does its work through the
//! [`FileManager`] and writes its human-facing result to `out`.

use crate::config::AppConfig;
use crate::error::AppResult;
use crate::registry::FileManager;
use crate::whitelist;
use csync_backup::BackupJob;
use std::io::Write;
use std::path::Path;
use tracing::{info, info_span, Instrument};

fn emit(out: &mut dyn Write, line: std::fmt::Arguments<'_>) -> AppResult<()> {
    writeln!(out, "{}", line)
        .map_err(|e| crate::error::AppError::Fs(csync_core::FsError::from(e)))
}

/// Push the membership store's records to the server whitelist.
pub async fn sync_whitelist(
    config: &AppConfig,
    records_file: &Path,
    out: &mut dyn Write,
) -> AppResult<()> {
    let span = info_span!("sync_whitelist", engine = %config.file_engine);
    async {
        let fm = FileManager::from_config(config)?;
        let records = whitelist::load_records(records_file)?;
        let count = whitelist::sync_whitelist(&fm, &records).await?;
        info!(count, "whitelist synchronised");
        emit(out, format_args!("Synchronised {} whitelist entries", count))
    }
    .instrument(span)
    .await
}

pub async fn show_whitelist(config: &AppConfig, out: &mut dyn Write) -> AppResult<()> {
    let fm = FileManager::from_config(config)?;
    let entries = whitelist::read_whitelist(&fm).await?;
    for entry in &entries {
        emit(out, format_args!("{}  {}", entry.uuid, entry.name))?;
    }
    emit(out, format_args!("{} entries", entries.len()))
}

/// Snapshot every configured source, pruning stale snapshots unless
/// `clean` is false.
pub async fn backup(config: &AppConfig, clean: bool, out: &mut dyn Write) -> AppResult<()> {
    let span = info_span!("backup", engine = %config.file_engine, clean);
    async {
        let fm = FileManager::from_config(config)?;
        let engine = fm.engine()?;
        let report = BackupJob::new(&config.backup)
            .clean(clean)
            .run(engine.as_ref())
            .await?;

        if let Some(pruned) = &report.pruned {
            for path in &pruned.removed {
                emit(out, format_args!("Removed outdated snapshot {}", path.display()))?;
            }
            for (path, reason) in &pruned.failed {
                emit(
                    out,
                    format_args!("Could not remove {}: {}", path.display(), reason),
                )?;
            }
        }
        for source in &report.sources {
            emit(
                out,
                format_args!(
                    "Copied {}: {} files, {} bytes",
                    source.source, source.stats.files_copied, source.stats.bytes_copied
                ),
            )?;
        }
        let totals = report.totals();
        info!(
            snapshot = %report.snapshot.display(),
            files = totals.files_copied,
            bytes = totals.bytes_copied,
            "backup complete"
        );
        emit(
            out,
            format_args!("Backup complete: {}", report.snapshot.display()),
        )
    }
    .instrument(span)
    .await
}

/// List the immediate children of `path`.
pub async fn ls(config: &AppConfig, path: &str, out: &mut dyn Write) -> AppResult<()> {
    let fm = FileManager::from_config(config)?;
    for name in fm.listdir(path).await? {
        emit(out, format_args!("{}", name))?;
    }
    Ok(())
}

/// Print a text file.
pub async fn cat(config: &AppConfig, path: &str, out: &mut dyn Write) -> AppResult<()> {
    let fm = FileManager::from_config(config)?;
    let text = fm.read_text(path).await?;
    write!(out, "{}", text).map_err(|e| crate::error::AppError::Fs(e.into()))
}
