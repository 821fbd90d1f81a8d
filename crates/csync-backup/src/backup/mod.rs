//! Snapshot backups.
//!
//! A snapshot is a directory under the backup destination named by
//! formatting the local time with a strftime pattern. The rotation
//! policy only identifies stale snapshots; the job deletes them before
//! copying every configured source into a fresh snapshot.

pub mod job;
pub mod rotation;
pub mod types;
