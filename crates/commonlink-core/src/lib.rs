//! Core types shared across the commonlink workspace.
//!
//! `commonlink` keeps a *project* directory in sync with a *common*
//! directory by replacing eligible project files with hardlinks to their
//! common counterparts, and can undo that by restoring independent copies.
//! This crate holds the vocabulary every other crate speaks: relative paths,
//! inode identity, the four-way classification, configuration, the
//! injectable environment, and the error taxonomy.

mod classification;
mod config;
mod env;
mod error;
mod identity;
mod path;

pub use classification::{Category, Classification};
pub use config::{
    DEFAULT_FILE_LIMIT, DEFAULT_GITIGNORE_FILES, DEFAULT_IGNORED, DEFAULT_TIME_LIMIT,
    ResolvedDirs, SyncConfig, SyncConfigBuilder, SyncConfigBuilderError, default_concurrency,
};
pub use env::{Clock, Environment, SystemClock};
pub use error::{PathError, SyncError, WalkWarning, WarningKind};
pub use identity::InodeInfo;
pub use path::RelativePath;
