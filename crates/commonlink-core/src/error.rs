//! Error types for sync operations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::path::RelativePath;

/// Fatal errors that abort a sync before any mutation.
///
/// Per-path problems are not represented here; they are collected as
/// [`PathError`]s and reported alongside the results.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Common and project directories resolve to the same place.
    #[error("commonDir and projectDir must be different ('{common}' == '{project}')")]
    SameDirectory { common: PathBuf, project: PathBuf },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Traversal found more files than allowed.
    #[error("Exceeded --file-limit={limit}")]
    LimitExceeded { limit: usize },

    /// Traversal did not finish in time.
    #[error("Exceeded --time-limit={seconds}")]
    DeadlineExceeded { seconds: u64 },

    /// The project directory has uncommitted changes.
    #[error(
        "Aborted due to uncommitted local changes in {path}; commit/stash them or use --no-git-check"
    )]
    DirtyWorkingTree { path: PathBuf },

    /// The version-control status query failed and nobody confirmed.
    #[error("Git check failed for {path}: {message}\nuse --no-git-check to avoid git check")]
    DirtyCheckFailed { path: PathBuf, message: String },

    /// The confirmation collaborator could not produce an answer.
    #[error("Confirmation prompt failed: {message}")]
    Prompt { message: String },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A worker pool or background task failed.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl SyncError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl std::fmt::Display) -> Self {
        Self::Internal {
            message: message.to_string(),
        }
    }

    /// Whether this error is a usage problem detected before traversal.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig { .. }
                | Self::SameDirectory { .. }
                | Self::NotADirectory { .. }
                | Self::NotFound { .. }
        )
    }

    /// Whether this error indicates a defect rather than a usage problem.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        if self.is_validation() { 2 } else { 1 }
    }
}

/// A per-path failure that did not abort the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathError {
    /// The path that failed.
    pub path: RelativePath,
    /// Human-readable message.
    pub message: String,
}

impl PathError {
    /// Create a new path error.
    pub fn new(path: RelativePath, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Kind of walk warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// Permission was denied.
    PermissionDenied,
    /// Error reading a directory.
    ReadError,
    /// Entry name could not be expressed relative to the root.
    InvalidPath,
}

/// Non-fatal warning encountered during traversal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl WalkWarning {
    /// Create a new walk warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a read error warning, classifying permission failures.
    pub fn read_error(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        let kind = match error.kind() {
            std::io::ErrorKind::PermissionDenied => WarningKind::PermissionDenied,
            _ => WarningKind::ReadError,
        };
        Self::new(path, format!("Read error: {error}"), kind)
    }
}
