//! The backup job: prune, create a snapshot, copy every source into it.

use crate::backup::rotation::{prune_stale, snapshot_name, stale_snapshots};
use crate::backup::types::{BackupReport, BackupSettings, SourceReport};
use chrono::{Local, NaiveDateTime};
use csync_core::{FileEngine, FsError, FsResult, Session};
use log::{info, warn};
use std::path::Path;

pub struct BackupJob<'a> {
    settings: &'a BackupSettings,
    clean: bool,
}

impl<'a> BackupJob<'a> {
    /// A job that prunes stale snapshots first.
    pub fn new(settings: &'a BackupSettings) -> Self {
        Self {
            settings,
            clean: true,
        }
    }

    /// Enable or disable the pruning pre-step.
    pub fn clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }

    pub async fn run(&self, engine: &dyn FileEngine) -> FsResult<BackupReport> {
        self.run_at(engine, Local::now().naive_local()).await
    }

    /// Run with an explicit snapshot time.
    pub async fn run_at(
        &self,
        engine: &dyn FileEngine,
        now: NaiveDateTime,
    ) -> FsResult<BackupReport> {
        let settings = self.settings;
        let destination = settings.destination.as_path();
        if !destination.is_dir() {
            return Err(FsError::not_found(format!(
                "Backup destination {} does not exist",
                destination.display()
            ))
            .with_path(destination.display().to_string()));
        }

        let pruned = if self.clean {
            info!(
                "Cleaning up old backups, keeping a rotation of {}",
                settings.rotation
            );
            let stale = stale_snapshots(destination, &settings.dir_format, settings.rotation)?;
            Some(prune_stale(&stale))
        } else {
            None
        };

        let name = snapshot_name(now, &settings.dir_format)?;
        let snapshot = destination.join(&name);
        std::fs::create_dir(&snapshot).map_err(|e| FsError::from_io(e, &snapshot))?;
        info!(
            "Backing up {:?} from {} into {}",
            settings.sources,
            engine.kind(),
            snapshot.display()
        );

        let mut session = engine.get_session().await?;
        let copied = copy_sources(session.as_mut(), &settings.sources, &snapshot).await;
        if let Err(e) = session.close().await {
            warn!("Closing {} session after backup failed: {}", engine.kind(), e);
        }
        let sources = copied?;

        Ok(BackupReport {
            snapshot,
            pruned,
            sources,
        })
    }
}

async fn copy_sources(
    session: &mut dyn Session,
    sources: &[String],
    snapshot: &Path,
) -> FsResult<Vec<SourceReport>> {
    let mut reports = Vec::with_capacity(sources.len());
    for source in sources {
        info!("Copying {}", source);
        let stats = session.copy_directory(source, snapshot).await?;
        reports.push(SourceReport {
            source: source.clone(),
            stats,
        });
    }
    Ok(reports)
}
