//! Uncommitted-changes check on the project directory.

use std::path::Path;

use git2::{Repository, StatusOptions};
use tracing::debug;

/// Reports whether a directory has uncommitted changes.
pub trait DirtyCheck: Send + Sync {
    /// `Ok(true)` when dirty. An `Err` carries a message describing why
    /// the query could not be answered.
    fn is_dirty(&self, dir: &Path) -> Result<bool, String>;
}

/// Queries the git repository that contains the directory.
///
/// Untracked files count as changes; ignored files do not. A directory
/// outside any repository is a query failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitStatusCheck;

impl DirtyCheck for GitStatusCheck {
    fn is_dirty(&self, dir: &Path) -> Result<bool, String> {
        let repo = Repository::discover(dir).map_err(|e| e.message().to_string())?;

        let mut options = StatusOptions::new();
        options
            .include_untracked(true)
            .include_ignored(false)
            .recurse_untracked_dirs(false);

        let statuses = repo
            .statuses(Some(&mut options))
            .map_err(|e| e.message().to_string())?;

        debug!(dir = %dir.display(), changes = statuses.len(), "git status");
        Ok(!statuses.is_empty())
    }
}
