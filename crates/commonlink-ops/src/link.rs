//! Async link operation with progress reporting.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tracing::debug;

use commonlink_core::{InodeInfo, RelativePath};

use crate::backup::{TEMP_SUFFIX, temp_prefix};
use crate::executor::{OperationResult, spawn_batch};
use crate::operation::{MutationOptions, OperationError};
use crate::progress::OperationType;

/// Start an async link operation.
///
/// Each path's project file is replaced by a hardlink to the common file
/// at the same relative path. Returns a receiver for progress updates and
/// the final completion.
pub fn start_link(
    paths: Vec<RelativePath>,
    common_dir: PathBuf,
    project_dir: PathBuf,
    options: MutationOptions,
) -> mpsc::Receiver<OperationResult> {
    spawn_batch(
        OperationType::Link,
        paths,
        options.concurrency,
        move |path| link_one(path, &common_dir, &project_dir),
    )
}

/// Link a single path from `common_dir` into `project_dir`.
///
/// Creates missing parent directories. A project file that already shares
/// the common file's inode is left alone and reports zero bytes. Otherwise
/// the link is staged next to the target and renamed over it, so the
/// target is never missing and is untouched if staging fails.
pub fn link_one(
    path: &RelativePath,
    common_dir: &Path,
    project_dir: &Path,
) -> Result<u64, OperationError> {
    let source = path.resolve(common_dir);
    let target = path.resolve(project_dir);
    link_file(&source, &target).map_err(|e| OperationError::new(path.clone(), e.to_string()))
}

fn link_file(source: &Path, target: &Path) -> io::Result<u64> {
    let source_meta = fs::symlink_metadata(source)?;
    if source_meta.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::IsADirectory,
            "common path is a directory",
        ));
    }

    let parent = target.parent().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "target has no parent directory")
    })?;
    fs::create_dir_all(parent)?;

    match fs::symlink_metadata(target) {
        Ok(meta) if InodeInfo::same(&source_meta, &meta) => {
            debug!(target = %target.display(), "already linked");
            return Ok(0);
        }
        Ok(meta) if meta.is_dir() => {
            return Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                "a directory exists at the project path",
            ));
        }
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    let prefix = temp_prefix(target);
    let staged = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(TEMP_SUFFIX)
        .make_in(parent, |staging| fs::hard_link(source, staging))?;

    // A failed rename drops the staged link.
    staged.persist(target).map_err(|e| e.error)?;

    debug!(source = %source.display(), target = %target.display(), "linked");
    Ok(source_meta.len())
}
