//! POSIX-style helpers for remote paths.
//!
//! Remote servers always use `/` separators, regardless of the host
//! platform, so these helpers operate on plain strings instead of
//! `std::path::Path`.

/// Split into non-empty components, dropping `.` segments.
pub fn components(path: &str) -> Vec<&str> {
    path.split('/')
        .filter(|c| !c.is_empty() && *c != ".")
        .collect()
}

/// Collapse duplicate separators and `.` segments, keeping a leading `/`.
pub fn normalize(path: &str) -> String {
    let joined = components(path).join("/");
    if path.starts_with('/') {
        format!("/{}", joined)
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// Join `rel` onto `base`. An absolute `rel` replaces `base`.
pub fn join(base: &str, rel: &str) -> String {
    if rel.starts_with('/') || base.is_empty() || base == "." {
        return normalize(rel);
    }
    if rel.is_empty() || rel == "." {
        return normalize(base);
    }
    normalize(&format!("{}/{}", base.trim_end_matches('/'), rel))
}

/// Path with the last component removed (`"."` for a single relative name).
pub fn parent(path: &str) -> String {
    let parts = components(path);
    let absolute = path.starts_with('/');
    match parts.len() {
        0 if absolute => "/".to_string(),
        0 | 1 if !absolute => ".".to_string(),
        _ => {
            let head = parts[..parts.len().saturating_sub(1)].join("/");
            if absolute {
                format!("/{}", head)
            } else {
                head
            }
        }
    }
}

/// Last component, or the empty string for a root path.
pub fn file_name(path: &str) -> &str {
    components(path).last().copied().unwrap_or("")
}

/// Number of components.
pub fn depth(path: &str) -> usize {
    components(path).len()
}

/// Components of `path` below `base`, or `None` if `path` is outside it.
pub fn strip_base<'a>(path: &'a str, base: &str) -> Option<Vec<&'a str>> {
    let full = components(path);
    let prefix = components(base);
    if full.len() < prefix.len() || full[..prefix.len()] != prefix[..] {
        return None;
    }
    Some(full[prefix.len()..].to_vec())
}
