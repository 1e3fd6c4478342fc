//! Device and inode identity for hardlink detection.

use std::fs::Metadata;
use std::io;
use std::path::Path;

#[cfg(unix)]
use std::os::unix::fs::MetadataExt;

use serde::{Deserialize, Serialize};

/// Inode information identifying the storage behind a directory entry.
///
/// Two entries are hardlinks of each other exactly when their `InodeInfo`
/// values are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InodeInfo {
    /// Inode number.
    pub inode: u64,
    /// Device ID.
    pub device: u64,
}

impl InodeInfo {
    /// Create new inode info.
    pub fn new(inode: u64, device: u64) -> Self {
        Self { inode, device }
    }

    /// Extract identity from metadata.
    ///
    /// Returns `None` on platforms without stable inode numbers; callers
    /// must then treat the entry as never linked.
    #[cfg(unix)]
    pub fn from_metadata(metadata: &Metadata) -> Option<Self> {
        Some(Self::new(metadata.ino(), metadata.dev()))
    }

    #[cfg(not(unix))]
    pub fn from_metadata(_metadata: &Metadata) -> Option<Self> {
        None
    }

    /// Whether two metadata records describe the same underlying file.
    pub fn same(a: &Metadata, b: &Metadata) -> bool {
        match (Self::from_metadata(a), Self::from_metadata(b)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Identity of the entry at `path`, without following symlinks.
    pub fn of(path: &Path) -> io::Result<Option<Self>> {
        std::fs::symlink_metadata(path).map(|m| Self::from_metadata(&m))
    }
}
