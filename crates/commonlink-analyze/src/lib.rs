//! Classification of project files against the common tree.
//!
//! Given the relative paths found by a traversal, the [`Classifier`]
//! decides for each one how the project-side file relates to the
//! common-side file:
//!
//! - **linked** - same device and inode (already a hardlink)
//! - **same** - identical bytes, distinct inode
//! - **different** - content differs
//! - **no_exist** - nothing at the project path
//!
//! Identity is checked before content, so linked files are never read.
//! Content is compared in fixed 64 KiB chunks and files of differing
//! length are never read at all.
//!
//! ```rust,no_run
//! use std::path::Path;
//! use commonlink_analyze::{Classifier, RelativePath};
//!
//! let paths = vec![RelativePath::new("README.md")];
//! let result = Classifier::new()
//!     .classify(&paths, Path::new("/common"), Path::new("/project"))
//!     .unwrap();
//!
//! println!("{} files can be linked", result.linkable().len());
//! ```

mod classify;
pub mod compare;

pub use classify::{Classifier, ClassifierConfig, ClassifierConfigBuilder};
pub use compare::{Comparison, DEFAULT_CHUNK_SIZE, compare_files};

// Re-export core types
pub use commonlink_core::{Category, Classification, PathError, RelativePath};
