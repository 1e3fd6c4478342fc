//! Directory traversal for commonlink.
//!
//! This crate turns a directory tree into the flat list of files a sync
//! run works on.
//!
//! # Overview
//!
//! - **Ignore rules** compiled from explicit patterns and gitignore-like files
//! - **Parallel traversal** via jwalk/rayon, pruning ignored directories
//! - **Hard bounds** on the number of files and on wall-clock time
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use commonlink_scan::{IgnoreMatcher, TraversalConfig, TreeWalker};
//!
//! let config = TraversalConfig::builder()
//!     .root("/path/to/common")
//!     .ignore(Arc::new(IgnoreMatcher::compile([".git", "*node_modules*"])))
//!     .build()
//!     .unwrap();
//!
//! let files = TreeWalker::default().walk(&config).unwrap();
//! for path in &files.paths {
//!     println!("{path}");
//! }
//! ```

mod ignore;
mod walker;

pub use ignore::{IgnoreMatcher, IgnoreRule, parse_gitignore, read_gitignore};
pub use walker::{FileList, TraversalConfig, TraversalConfigBuilder, TreeWalker};

// Re-export core types for convenience
pub use commonlink_core::{RelativePath, SyncError, WalkWarning, WarningKind};
