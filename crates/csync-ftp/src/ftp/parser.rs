//! LIST / MLSD response parser.
//!
//! Supports three formats:
//! 1. **MLSD facts** (RFC 3659): `type=file;size=1234;modify=20260101120000; file.txt`
//! 2. **Unix-style** (`ls -l`): `-rwxr-xr-x 1 owner group 1234 Jan  1 12:00 file.txt`
//! 3. **Windows/IIS-style**: `01-01-26  12:00AM       1234 file.txt`
//!
//! Lines that match none of them are kept as `Unknown` entries and are
//! skipped by directory scans.

use crate::ftp::types::{FtpEntry, FtpEntryKind};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

lazy_static! {
    static ref UNIX_RE: Regex = Regex::new(
        r"(?x)
        ^([dlcbps-][rwxsStT-]{9})[+@.]?\s+  # permissions
        (\d+)\s+                            # link count
        (\S+)\s+                            # owner
        (\S+)\s+                            # group
        (\d+)\s+                            # size
        (\w{3}\s+\d{1,2}\s+[\d:]+)\s         # date
        (.+)$                               # filename (possibly with -> target)
        ",
    )
    .expect("valid unix listing regex");
    static ref WINDOWS_RE: Regex = Regex::new(
        r"(?x)
        ^(\d{2}-\d{2}-\d{2,4})\s+           # date
        (\d{1,2}:\d{2}(?:AM|PM)?)\s+        # time
        (<DIR>|\d+)\s+                      # size or <DIR>
        (.+)$                               # filename
        ",
    )
    .expect("valid windows listing regex");
}

/// Parse a full multi-line LIST or MLSD response body.
pub fn parse_listing(raw: &str) -> Vec<FtpEntry> {
    raw.lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty())
        .filter(|l| !l.starts_with("total "))
        .filter_map(parse_line)
        .filter(|e| e.name != "." && e.name != "..")
        .collect()
}

fn parse_line(line: &str) -> Option<FtpEntry> {
    if looks_like_mlsd(line) {
        return parse_mlsd(line);
    }
    if let Some(e) = parse_unix(line) {
        return Some(e);
    }
    if let Some(e) = parse_windows(line) {
        return Some(e);
    }
    log::debug!("Unrecognised listing line: {}", line);
    Some(FtpEntry::new(line.trim(), FtpEntryKind::Unknown))
}

// ─── MLSD parser ─────────────────────────────────────────────────────

/// The fact block is the first token and always ends in `;`.
fn looks_like_mlsd(line: &str) -> bool {
    line.split(' ')
        .next()
        .is_some_and(|facts| facts.contains('=') && facts.ends_with(';'))
}

/// `fact1=val1;fact2=val2; filename`. Names may contain spaces.
fn parse_mlsd(line: &str) -> Option<FtpEntry> {
    let (facts_str, name) = line.split_once(' ')?;
    if name.is_empty() {
        return None;
    }

    let facts: HashMap<String, String> = facts_str
        .split(';')
        .filter_map(|segment| segment.trim().split_once('='))
        .map(|(k, v)| (k.to_lowercase(), v.to_string()))
        .collect();

    let kind = match facts.get("type").map(|s| s.to_lowercase()).as_deref() {
        // The listed directory itself and its parent.
        Some("cdir") | Some("pdir") => return None,
        Some("dir") => FtpEntryKind::Directory,
        Some("file") => FtpEntryKind::File,
        Some("os.unix=symlink") | Some("os.unix=slink") => FtpEntryKind::Symlink,
        _ => FtpEntryKind::Unknown,
    };

    Some(FtpEntry::new(name, kind))
}

// ─── Unix-style parser ───────────────────────────────────────────────

/// ```text
/// drwxr-xr-x   2 user group  4096 Jan  1 12:00 dirname
/// -rw-r--r--   1 user group  1234 Jan  1  2025 file.txt
/// lrwxrwxrwx   1 user group    42 Jan  1 12:00 link -> target
/// ```
fn parse_unix(line: &str) -> Option<FtpEntry> {
    let caps = UNIX_RE.captures(line)?;

    let perms = caps.get(1)?.as_str();
    let name_raw = caps.get(7)?.as_str().trim_start();

    let kind = match perms.as_bytes().first() {
        Some(b'd') => FtpEntryKind::Directory,
        Some(b'l') => FtpEntryKind::Symlink,
        Some(b'-') => FtpEntryKind::File,
        _ => FtpEntryKind::Unknown,
    };

    // Links list as `name -> target`; only the name is kept.
    let name = match kind {
        FtpEntryKind::Symlink => name_raw.split_once(" -> ").map_or(name_raw, |(n, _)| n),
        _ => name_raw,
    };
    Some(FtpEntry::new(name, kind))
}

// ─── Windows-style parser ────────────────────────────────────────────

/// ```text
/// 01-01-26  12:00AM       1234 file.txt
/// 01-01-26  12:00PM      <DIR> Directory Name
/// ```
fn parse_windows(line: &str) -> Option<FtpEntry> {
    let caps = WINDOWS_RE.captures(line)?;
    let kind = if caps.get(3)?.as_str() == "<DIR>" {
        FtpEntryKind::Directory
    } else {
        FtpEntryKind::File
    };
    Some(FtpEntry::new(caps.get(4)?.as_str(), kind))
}
