//! Session log discovery.
//!
//! Walks root directories for files named `session-<id>.jsonl`. Recursion is
//! bounded: only subdirectories literally named `logs`, or with names long
//! enough to look machine-generated (session hashes, cache keys), are
//! descended into. That keeps a root like a home directory from turning into
//! a full filesystem walk.

use std::path::{Path, PathBuf};

const SESSION_LOG_PREFIX: &str = "session-";
const SESSION_LOG_EXT: &str = ".jsonl";
const LOGS_DIR_NAME: &str = "logs";

/// Directory names longer than this are treated as machine-generated and
/// worth descending into.
const GENERATED_NAME_LEN: usize = 20;

/// A session log file found under a root, with its size at discovery time.
#[derive(Debug, Clone)]
pub struct DiscoveredLog {
    pub path: PathBuf,
    pub len: u64,
    /// Session id segment of the filename.
    pub session_id: String,
}

/// Extract the session id from a `session-<id>.jsonl` filename.
///
/// # Examples
///
/// ```
/// use logscope::watcher::extract_session_id;
///
/// assert_eq!(extract_session_id("session-abc123.jsonl"), Some("abc123"));
/// assert_eq!(extract_session_id("other.jsonl"), None);
/// ```
#[must_use]
pub fn extract_session_id(filename: &str) -> Option<&str> {
    let stem = filename.strip_suffix(SESSION_LOG_EXT)?;
    let id = stem.strip_prefix(SESSION_LOG_PREFIX)?;
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

/// Whether a path names a session log file.
#[must_use]
pub fn is_session_log(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(extract_session_id)
        .is_some()
}

/// Collect every session log under `root`.
///
/// Unreadable directories and files that vanish mid-scan are skipped; the
/// next scan pass will pick up whatever they hid.
#[must_use]
pub fn collect_session_logs(root: &Path) -> Vec<DiscoveredLog> {
    let mut found = Vec::new();
    walk(root, &mut found);
    found
}

fn walk(dir: &Path, found: &mut Vec<DiscoveredLog>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        tracing::debug!(dir = %dir.display(), "Skipping unreadable directory");
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };

        if file_type.is_dir() {
            if should_descend(&path) {
                walk(&path, found);
            }
        } else if file_type.is_file() {
            let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            let Some(session_id) = extract_session_id(name) else {
                continue;
            };
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            found.push(DiscoveredLog {
                session_id: session_id.to_string(),
                len: metadata.len(),
                path,
            });
        }
    }
}

fn should_descend(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name == LOGS_DIR_NAME || name.len() > GENERATED_NAME_LEN)
}
