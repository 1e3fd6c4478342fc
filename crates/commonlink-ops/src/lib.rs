//! Filesystem mutation engine for commonlink.
//!
//! This crate provides the two mutating operations, linking project files
//! to their common counterparts and restoring linked files to independent
//! copies, with progress reporting via channels.
//!
//! Every path is processed as one blocking task. At most
//! [`MutationOptions::concurrency`] tasks run at once, and a failure on one
//! path is recorded in the final [`OperationComplete`] without stopping the
//! others. Neither operation leaves a window in which the target path is
//! missing.

mod backup;
mod executor;
mod link;
mod operation;
mod progress;
mod unlink;

pub use backup::{BACKUP_SUFFIX, TEMP_SUFFIX, backup_path};
pub use executor::{OperationResult, drain_results};
pub use link::{link_one, start_link};
pub use operation::{MutationOptions, OperationError};
pub use progress::{OperationComplete, OperationProgress, OperationType};
pub use unlink::{restore_one, start_unlink};

/// Default channel buffer size for operation progress updates.
pub const OPERATION_CHANNEL_SIZE: usize = 100;
