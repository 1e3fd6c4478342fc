//! Per-path error and option types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use commonlink_core::{RelativePath, default_concurrency};

/// Options shared by link and unlink operations.
#[derive(Debug, Clone)]
pub struct MutationOptions {
    /// Maximum number of paths processed at once.
    pub concurrency: usize,
}

impl Default for MutationOptions {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

/// An error that occurred while mutating one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationError {
    /// The path that caused the error.
    pub path: RelativePath,
    /// A human-readable error message.
    pub message: String,
    /// Backup left on disk that needs manual recovery.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup: Option<PathBuf>,
}

impl OperationError {
    /// Create a new operation error.
    pub fn new(path: RelativePath, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
            backup: None,
        }
    }

    /// Create an error that leaves a backup file behind.
    pub fn with_backup(path: RelativePath, message: impl Into<String>, backup: PathBuf) -> Self {
        Self {
            path,
            message: message.into(),
            backup: Some(backup),
        }
    }
}

impl std::fmt::Display for OperationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)?;
        if let Some(backup) = &self.backup {
            write!(f, " (backup at {})", backup.display())?;
        }
        Ok(())
    }
}
