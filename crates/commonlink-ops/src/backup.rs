//! Names for staged and backup siblings.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Suffix of the sibling an original is moved to while being restored.
pub const BACKUP_SUFFIX: &str = "commonlink-backup";

/// Suffix of staged temporary siblings.
pub const TEMP_SUFFIX: &str = ".commonlink-tmp";

/// Find an unused backup name next to `path`.
///
/// Tries `<name>.commonlink-backup`, then `<name>.commonlink-backup.1`
/// through `.999`, then falls back to a timestamp.
pub fn backup_path(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new(""));
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let first = parent.join(format!("{name}.{BACKUP_SUFFIX}"));
    if !occupied(&first) {
        return first;
    }

    for i in 1..1000 {
        let candidate = parent.join(format!("{name}.{BACKUP_SUFFIX}.{i}"));
        if !occupied(&candidate) {
            return candidate;
        }
    }

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    parent.join(format!("{name}.{BACKUP_SUFFIX}.{timestamp}"))
}

/// Prefix for a temporary sibling of `path`, hidden and named after it.
pub(crate) fn temp_prefix(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!(".{name}.")
}

// Dangling symlinks count as taken.
fn occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}
