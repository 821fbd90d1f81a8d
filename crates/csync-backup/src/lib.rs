pub mod backup;

pub use backup::job::BackupJob;
pub use backup::rotation::{
    parse_snapshot_name, prune_stale, snapshot_name, stale_snapshots, validate_format,
};
pub use backup::types::*;
