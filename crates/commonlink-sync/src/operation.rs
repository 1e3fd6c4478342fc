//! The two sync workflows.

use std::path::Path;

use serde::{Deserialize, Serialize};
use strum::Display;

use commonlink_core::ResolvedDirs;

/// Which workflow a run performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
    /// Replace eligible project files with hardlinks to common files.
    Link,
    /// Replace linked project files with independent copies.
    Unlink,
}

impl Operation {
    /// Directory the workflow traverses.
    pub fn walk_root(self, dirs: &ResolvedDirs) -> &Path {
        match self {
            Self::Link => &dirs.common_dir,
            Self::Unlink => &dirs.project_dir,
        }
    }
}
