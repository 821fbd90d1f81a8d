//! Whitelist sync: membership records in, the server's whitelist file out.

use crate::error::{AppError, AppResult};
use crate::registry::FileManager;
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// One approved player as exported by the membership store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistRecord {
    pub username: String,
    /// Account id as 32 hex digits, no dashes.
    pub id: String,
}

/// One element of the server's whitelist file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistEntry {
    /// Hyphenated 8-4-4-4-12, digits as stored in the record.
    pub uuid: String,
    pub name: String,
}

impl TryFrom<&WhitelistRecord> for WhitelistEntry {
    type Error = AppError;

    fn try_from(record: &WhitelistRecord) -> AppResult<Self> {
        let id = record.id.trim();
        if id.len() != 32 || !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AppError::InvalidRecord(format!(
                "id for '{}' must be 32 hex digits, got '{}'",
                record.username, record.id
            )));
        }
        Uuid::parse_str(id)
            .map_err(|e| AppError::InvalidRecord(format!("{}: {}", record.id, e)))?;
        let uuid = format!(
            "{}-{}-{}-{}-{}",
            &id[..8],
            &id[8..12],
            &id[12..16],
            &id[16..20],
            &id[20..]
        );
        if record.username.trim().is_empty() {
            return Err(AppError::InvalidRecord(format!(
                "record with id '{}' has an empty username",
                record.id
            )));
        }
        Ok(Self {
            uuid,
            name: record.username.clone(),
        })
    }
}

/// Convert every record, failing on the first malformed one.
pub fn entries_from_records(records: &[WhitelistRecord]) -> AppResult<Vec<WhitelistEntry>> {
    records.iter().map(WhitelistEntry::try_from).collect()
}

/// Pretty-print with a four-space indent.
pub fn render(entries: &[WhitelistEntry]) -> AppResult<String> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    entries
        .serialize(&mut ser)
        .map_err(|e| AppError::json("whitelist", e))?;
    String::from_utf8(out).map_err(|e| AppError::InvalidRecord(e.to_string()))
}

/// Read records from a JSON file (an array of `{username, id}`).
pub fn load_records(path: &Path) -> AppResult<Vec<WhitelistRecord>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| AppError::Fs(csync_core::FsError::from_io(e, path)))?;
    serde_json::from_str(&text).map_err(|e| AppError::json(path.display().to_string(), e))
}

/// Replace the whitelist on the active engine. Returns the entry count.
pub async fn sync_whitelist(fm: &FileManager, records: &[WhitelistRecord]) -> AppResult<usize> {
    let entries = entries_from_records(records)?;
    let text = render(&entries)?;
    let path = fm.whitelist_path()?;
    log::info!(
        "Writing {} whitelist entries to '{}' via {}",
        entries.len(),
        path,
        fm.active_name()
    );
    fm.write_text(&path, &text).await?;
    Ok(entries.len())
}

/// Read the whitelist back from the active engine.
pub async fn read_whitelist(fm: &FileManager) -> AppResult<Vec<WhitelistEntry>> {
    let path = fm.whitelist_path()?;
    let text = fm.read_text(&path).await?;
    serde_json::from_str(&text).map_err(|e| AppError::json(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, id: &str) -> WhitelistRecord {
        WhitelistRecord {
            username: name.into(),
            id: id.into(),
        }
    }

    #[test]
    fn id_is_regrouped_keeping_case() {
        let entry =
            WhitelistEntry::try_from(&record("Notch", "069A79F444E94726A5BEFCA90E38AAF5")).unwrap();
        assert_eq!(entry.uuid, "069A79F4-44E9-4726-A5BE-FCA90E38AAF5");
        assert_eq!(entry.name, "Notch");

        let mixed = WhitelistEntry::try_from(&record("jeb_", " 853c80EF3c3749fdaa49938b674adae6 "))
            .unwrap();
        assert_eq!(mixed.uuid, "853c80EF-3c37-49fd-aa49-938b674adae6");
    }

    #[test]
    fn malformed_ids_are_rejected() {
        for id in ["", "1234", "069a79f4-44e9-4726-a5be-fca90e38aaf5", &"z".repeat(32)] {
            let err = WhitelistEntry::try_from(&record("x", id)).unwrap_err();
            assert_eq!(err.exit_code(), 5, "{}", id);
        }
        let err = WhitelistEntry::try_from(&record(" ", &"a".repeat(32))).unwrap_err();
        assert!(matches!(err, AppError::InvalidRecord(_)));
    }

    #[test]
    fn renders_four_space_indent() {
        let entries =
            entries_from_records(&[record("jeb_", "853c80ef3c3749fdaa49938b674adae6")]).unwrap();
        let text = render(&entries).unwrap();
        assert_eq!(
            text,
            "[\n    {\n        \"uuid\": \"853c80ef-3c37-49fd-aa49-938b674adae6\",\n        \"name\": \"jeb_\"\n    }\n]"
        );
        let back: Vec<WhitelistEntry> = serde_json::from_str(&text).unwrap();
        assert_eq!(back, entries);
    }

    #[test]
    fn empty_record_set_renders_empty_array() {
        assert_eq!(render(&[]).unwrap(), "[]");
    }
}
