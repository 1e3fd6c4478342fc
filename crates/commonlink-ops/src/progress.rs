//! Progress reporting types for link and unlink operations.

use serde::{Deserialize, Serialize};

use commonlink_core::RelativePath;

use crate::OperationError;

/// The type of operation being performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    Link,
    Unlink,
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Link => write!(f, "Link"),
            Self::Unlink => write!(f, "Unlink"),
        }
    }
}

/// Progress information for an ongoing operation.
#[derive(Debug, Clone, Serialize)]
pub struct OperationProgress {
    /// The type of operation.
    pub operation_type: OperationType,
    /// Number of paths finished, successfully or not.
    pub files_completed: usize,
    /// Total number of paths to process.
    pub files_total: usize,
    /// Number of bytes linked or copied so far.
    pub bytes_processed: u64,
    /// The path most recently finished.
    pub current_file: Option<RelativePath>,
    /// Errors encountered so far.
    pub errors: Vec<OperationError>,
}

impl OperationProgress {
    /// Create a new progress tracker for an operation.
    pub fn new(operation_type: OperationType, files_total: usize) -> Self {
        Self {
            operation_type,
            files_completed: 0,
            files_total,
            bytes_processed: 0,
            current_file: None,
            errors: Vec::new(),
        }
    }

    /// Get the progress as a percentage (0.0 to 100.0).
    pub fn percentage(&self) -> f64 {
        if self.files_total > 0 {
            (self.files_completed as f64 / self.files_total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Check if the operation has any errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Record a failed path.
    pub fn add_error(&mut self, error: OperationError) {
        self.files_completed += 1;
        self.errors.push(error);
    }

    /// Update the current file being processed.
    pub fn set_current_file(&mut self, path: Option<RelativePath>) {
        self.current_file = path;
    }

    /// Increment the completed count and add bytes.
    pub fn complete_file(&mut self, bytes: u64) {
        self.files_completed += 1;
        self.bytes_processed += bytes;
    }
}

/// Result of a completed operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationComplete {
    /// The type of operation.
    pub operation_type: OperationType,
    /// Number of paths successfully processed.
    pub succeeded: usize,
    /// Number of paths that failed.
    pub failed: usize,
    /// Total bytes linked or copied.
    pub bytes_processed: u64,
    /// Errors that occurred, sorted by path.
    pub errors: Vec<OperationError>,
}

impl OperationComplete {
    /// Completion record for an operation with nothing to do.
    pub fn empty(operation_type: OperationType) -> Self {
        Self {
            operation_type,
            succeeded: 0,
            failed: 0,
            bytes_processed: 0,
            errors: Vec::new(),
        }
    }

    /// Check if the operation was fully successful.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Get a human-readable summary of the operation.
    pub fn summary(&self) -> String {
        let action = match self.operation_type {
            OperationType::Link => "Linked",
            OperationType::Unlink => "Restored",
        };
        let noun = if self.succeeded == 1 { "file" } else { "files" };

        if self.failed == 0 {
            format!("{} {} {}", action, self.succeeded, noun)
        } else {
            format!("{} {} {}, {} failed", action, self.succeeded, noun, self.failed)
        }
    }
}
