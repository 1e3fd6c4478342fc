//! Async restore operation that turns hardlinks back into independent
//! copies.
//!
//! Per path the sequence is:
//! 1. copy the bytes, permissions and modification time to a temp sibling
//! 2. rename the original aside to a backup sibling
//! 3. rename the temp copy to the original name
//! 4. remove the backup
//!
//! A failure before step 2 only drops the temp copy. A failure at step 3
//! renames the backup back. A failure at step 4 leaves the backup in place
//! and names it in the error. The target path always holds either the
//! original link or the finished copy, except when the rollback itself
//! fails; the error then names the backup holding the original.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tokio::sync::mpsc;
use tracing::{debug, error};

use commonlink_core::RelativePath;

use crate::backup::{TEMP_SUFFIX, backup_path, temp_prefix};
use crate::executor::{OperationResult, spawn_batch};
use crate::operation::{MutationOptions, OperationError};
use crate::progress::OperationType;

/// Start an async unlink operation over paths relative to `project_dir`.
pub fn start_unlink(
    paths: Vec<RelativePath>,
    project_dir: PathBuf,
    options: MutationOptions,
) -> mpsc::Receiver<OperationResult> {
    spawn_batch(
        OperationType::Unlink,
        paths,
        options.concurrency,
        move |path| restore_one(path, &project_dir),
    )
}

/// Replace one linked file with an independent copy of its bytes.
///
/// Returns the number of bytes copied.
pub fn restore_one(path: &RelativePath, project_dir: &Path) -> Result<u64, OperationError> {
    restore_with(path, project_dir, &DiskSteps)
}

/// The renames and removals that follow staging.
trait RestoreSteps {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
    fn install(&self, staged: NamedTempFile, target: &Path) -> io::Result<()>;
    fn remove(&self, path: &Path) -> io::Result<()>;
}

struct DiskSteps;

impl RestoreSteps for DiskSteps {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    // A failed persist drops the temp file with the error.
    fn install(&self, staged: NamedTempFile, target: &Path) -> io::Result<()> {
        staged.persist(target).map(drop).map_err(|e| e.error)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}

fn restore_with(
    path: &RelativePath,
    project_dir: &Path,
    steps: &impl RestoreSteps,
) -> Result<u64, OperationError> {
    let target = path.resolve(project_dir);
    let fail = |message: String| OperationError::new(path.clone(), message);

    let meta = fs::symlink_metadata(&target).map_err(|e| fail(e.to_string()))?;
    if !meta.is_file() {
        return Err(fail("not a regular file".to_string()));
    }
    let parent = target
        .parent()
        .ok_or_else(|| fail("target has no parent directory".to_string()))?;

    let (staged, bytes) = stage_copy(&target, parent, &meta)
        .map_err(|e| fail(format!("failed to copy: {e}")))?;

    let backup = backup_path(&target);
    steps
        .rename(&target, &backup)
        .map_err(|e| fail(format!("failed to move original aside: {e}")))?;

    if let Err(install) = steps.install(staged, &target) {
        return match steps.rename(&backup, &target) {
            Ok(()) => Err(fail(format!("failed to install copy: {install}"))),
            Err(rollback) => {
                error!(
                    target = %target.display(),
                    backup = %backup.display(),
                    "restore and rollback both failed"
                );
                Err(OperationError::with_backup(
                    path.clone(),
                    format!("failed to install copy: {install}; rollback failed: {rollback}"),
                    backup,
                ))
            }
        };
    }

    if let Err(e) = steps.remove(&backup) {
        return Err(OperationError::with_backup(
            path.clone(),
            format!("copy restored but backup could not be removed: {e}"),
            backup,
        ));
    }

    debug!(target = %target.display(), bytes, "restored independent copy");
    Ok(bytes)
}

fn stage_copy(
    target: &Path,
    parent: &Path,
    meta: &fs::Metadata,
) -> io::Result<(NamedTempFile, u64)> {
    let prefix = temp_prefix(target);
    let mut staged = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(parent)?;

    let mut source = File::open(target)?;
    let bytes = io::copy(&mut source, staged.as_file_mut())?;

    let file = staged.as_file();
    file.set_permissions(meta.permissions())?;
    if let Ok(modified) = meta.modified() {
        file.set_modified(modified)?;
    }
    file.sync_all()?;

    Ok((staged, bytes))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use commonlink_core::InodeInfo;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_restore_breaks_link() {
        let temp = TempDir::new().unwrap();
        let common = temp.path().join("common.txt");
        let project = temp.path().join("project");
        fs::create_dir(&project).unwrap();
        fs::write(&common, "shared bytes").unwrap();
        fs::set_permissions(&common, fs::Permissions::from_mode(0o640)).unwrap();
        fs::hard_link(&common, project.join("file.txt")).unwrap();

        let bytes = restore_one(&RelativePath::new("file.txt"), &project).unwrap();
        assert_eq!(bytes, 12);

        let restored = project.join("file.txt");
        assert_eq!(fs::read_to_string(&restored).unwrap(), "shared bytes");
        assert_ne!(InodeInfo::of(&restored).unwrap(), InodeInfo::of(&common).unwrap());
        assert_eq!(
            fs::metadata(&restored).unwrap().permissions().mode() & 0o777,
            0o640
        );
        assert_eq!(
            fs::metadata(&restored).unwrap().modified().unwrap(),
            fs::metadata(&common).unwrap().modified().unwrap()
        );
        assert_eq!(entries(&project), vec!["file.txt"]);
    }

    #[test]
    fn test_restore_rejects_symlink() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("real"), "x").unwrap();
        std::os::unix::fs::symlink("real", temp.path().join("alias")).unwrap();

        let err = restore_one(&RelativePath::new("alias"), temp.path()).unwrap_err();
        assert!(err.message.contains("not a regular file"));
        assert!(fs::symlink_metadata(temp.path().join("alias"))
            .unwrap()
            .file_type()
            .is_symlink());
    }

    #[test]
    fn test_restore_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = restore_one(&RelativePath::new("gone"), temp.path()).unwrap_err();
        assert!(err.backup.is_none());
    }

    /// Steps that fail on request and otherwise act on disk.
    #[derive(Default)]
    struct FaultySteps {
        fail_aside: bool,
        fail_install: bool,
        fail_rollback: bool,
        fail_remove: bool,
    }

    fn injected(step: &str) -> io::Error {
        io::Error::other(format!("injected {step} failure"))
    }

    impl RestoreSteps for FaultySteps {
        fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
            let rollback = from.to_string_lossy().contains(crate::BACKUP_SUFFIX);
            if rollback && self.fail_rollback {
                return Err(injected("rollback"));
            }
            if !rollback && self.fail_aside {
                return Err(injected("rename"));
            }
            DiskSteps.rename(from, to)
        }

        fn install(&self, staged: NamedTempFile, target: &Path) -> io::Result<()> {
            if self.fail_install {
                return Err(injected("install"));
            }
            DiskSteps.install(staged, target)
        }

        fn remove(&self, path: &Path) -> io::Result<()> {
            if self.fail_remove {
                return Err(injected("remove"));
            }
            DiskSteps.remove(path)
        }
    }

    struct Linked {
        _temp: TempDir,
        common: PathBuf,
        project: PathBuf,
    }

    fn linked_pair() -> Linked {
        let temp = TempDir::new().unwrap();
        let common = temp.path().join("common.txt");
        let project = temp.path().join("project");
        fs::create_dir(&project).unwrap();
        fs::write(&common, "shared bytes").unwrap();
        fs::hard_link(&common, project.join("file.txt")).unwrap();
        Linked {
            _temp: temp,
            common,
            project,
        }
    }

    fn still_linked(pair: &Linked) -> bool {
        InodeInfo::of(&pair.common).unwrap() == InodeInfo::of(&pair.project.join("file.txt")).unwrap()
    }

    #[test]
    fn test_failed_move_aside_drops_copy() {
        let pair = linked_pair();
        let steps = FaultySteps {
            fail_aside: true,
            ..Default::default()
        };

        let err = restore_with(&RelativePath::new("file.txt"), &pair.project, &steps).unwrap_err();
        assert!(err.message.contains("move original aside"));
        assert!(err.backup.is_none());
        assert!(still_linked(&pair));
        assert_eq!(entries(&pair.project), vec!["file.txt"]);
    }

    #[test]
    fn test_failed_install_rolls_back() {
        let pair = linked_pair();
        let steps = FaultySteps {
            fail_install: true,
            ..Default::default()
        };

        let err = restore_with(&RelativePath::new("file.txt"), &pair.project, &steps).unwrap_err();
        assert!(err.message.contains("failed to install copy"));
        assert!(err.backup.is_none());
        assert!(still_linked(&pair));
        assert_eq!(entries(&pair.project), vec!["file.txt"]);
    }

    #[test]
    fn test_failed_rollback_names_backup() {
        let pair = linked_pair();
        let steps = FaultySteps {
            fail_install: true,
            fail_rollback: true,
            ..Default::default()
        };

        let err = restore_with(&RelativePath::new("file.txt"), &pair.project, &steps).unwrap_err();
        let backup = err.backup.clone().unwrap();
        assert!(err.message.contains("rollback failed"));
        assert_eq!(fs::read_to_string(&backup).unwrap(), "shared bytes");
        assert_eq!(InodeInfo::of(&backup).unwrap(), InodeInfo::of(&pair.common).unwrap());
        assert_eq!(entries(&pair.project), vec!["file.txt.commonlink-backup"]);
    }

    #[test]
    fn test_failed_backup_removal_keeps_copy() {
        let pair = linked_pair();
        let steps = FaultySteps {
            fail_remove: true,
            ..Default::default()
        };

        let err = restore_with(&RelativePath::new("file.txt"), &pair.project, &steps).unwrap_err();
        let backup = err.backup.clone().unwrap();
        assert!(err.message.contains("backup could not be removed"));
        assert!(!still_linked(&pair));
        assert_eq!(
            fs::read_to_string(pair.project.join("file.txt")).unwrap(),
            "shared bytes"
        );
        assert_eq!(fs::read_to_string(&backup).unwrap(), "shared bytes");
        assert_eq!(
            entries(&pair.project),
            vec!["file.txt", "file.txt.commonlink-backup"]
        );
    }

    #[test]
    fn test_read_only_directory_leaves_link_intact() {
        let pair = linked_pair();
        fs::set_permissions(&pair.project, fs::Permissions::from_mode(0o555)).unwrap();

        // Privileged users can write anyway; nothing to observe then.
        let writable = File::create(pair.project.join("write-check")).is_ok();
        if writable {
            fs::remove_file(pair.project.join("write-check")).unwrap();
            fs::set_permissions(&pair.project, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result = restore_one(&RelativePath::new("file.txt"), &pair.project);
        fs::set_permissions(&pair.project, fs::Permissions::from_mode(0o755)).unwrap();

        let err = result.unwrap_err();
        assert!(err.message.contains("failed to copy"));
        assert!(err.backup.is_none());
        assert!(still_linked(&pair));
        assert_eq!(entries(&pair.project), vec!["file.txt"]);
    }
}
