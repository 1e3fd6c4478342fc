//! JWalk-based bounded directory walker.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use derive_builder::Builder;
use indexmap::IndexSet;
use jwalk::{Parallelism, WalkDir};
use tracing::{debug, info, warn};

use commonlink_core::{
    Clock, DEFAULT_FILE_LIMIT, DEFAULT_TIME_LIMIT, RelativePath, SyncError, SystemClock,
    WalkWarning, WarningKind,
};

use crate::ignore::IgnoreMatcher;

/// Configuration for one traversal.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct TraversalConfig {
    /// Directory to walk.
    pub root: PathBuf,

    /// Paths for which this returns true are skipped; directories are pruned.
    #[builder(default)]
    pub ignore: Arc<IgnoreMatcher>,

    /// Maximum number of files before the walk fails.
    #[builder(default = "DEFAULT_FILE_LIMIT")]
    pub file_limit: usize,

    /// Wall-clock budget in seconds.
    #[builder(default = "DEFAULT_TIME_LIMIT")]
    pub time_limit: u64,

    /// Number of threads for reading directories (0 = shared rayon pool).
    #[builder(default = "0")]
    pub threads: usize,
}

impl TraversalConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.root {
            Some(ref root) if root.as_os_str().is_empty() => {
                Err("Root path cannot be empty".to_string())
            }
            Some(_) => Ok(()),
            None => Err("Root path is required".to_string()),
        }
    }
}

impl TraversalConfig {
    /// Create a new traversal config builder.
    pub fn builder() -> TraversalConfigBuilder {
        TraversalConfigBuilder::default()
    }

    /// Create a config with default limits and no ignore rules.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ignore: Arc::new(IgnoreMatcher::new()),
            file_limit: DEFAULT_FILE_LIMIT,
            time_limit: DEFAULT_TIME_LIMIT,
            threads: 0,
        }
    }
}

/// Files discovered by a completed traversal.
#[derive(Debug, Clone)]
pub struct FileList {
    /// Canonical root that was walked.
    pub root: PathBuf,
    /// Root-relative file and symlink paths in discovery order.
    pub paths: IndexSet<RelativePath>,
    /// Directories entered, root excluded.
    pub dirs_visited: u64,
    /// Non-fatal problems encountered.
    pub warnings: Vec<WalkWarning>,
    /// Time taken.
    pub duration: Duration,
}

impl FileList {
    /// Number of files found.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check if no files were found.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Paths as an owned vector.
    pub fn to_vec(&self) -> Vec<RelativePath> {
        self.paths.iter().cloned().collect()
    }
}

/// Walks a directory tree under ignore rules, a file-count ceiling and a
/// deadline.
///
/// Directories are descended into; regular files and symlinks are reported
/// as leaves and symlinks are never followed.
#[derive(Debug, Clone)]
pub struct TreeWalker {
    clock: Arc<dyn Clock>,
}

impl TreeWalker {
    /// Create a walker using the given clock for its deadline.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Walk `config.root` and return every non-ignored file.
    ///
    /// Fails with [`SyncError::LimitExceeded`] once more than
    /// `config.file_limit` files are found and with
    /// [`SyncError::DeadlineExceeded`] when `config.time_limit` elapses.
    /// Either way no partial result is returned.
    pub fn walk(&self, config: &TraversalConfig) -> Result<FileList, SyncError> {
        let start = self.clock.now();
        let deadline = start + Duration::from_secs(config.time_limit);
        let deadline_error = || SyncError::DeadlineExceeded {
            seconds: config.time_limit,
        };

        let root = config
            .root
            .canonicalize()
            .map_err(|e| SyncError::io(&config.root, e))?;
        if !root.is_dir() {
            return Err(SyncError::NotADirectory { path: root });
        }

        let expired = Arc::new(AtomicBool::new(false));
        let walker = self.build_walker(config, &root, deadline, Arc::clone(&expired));

        let mut paths = IndexSet::new();
        let mut dirs_visited = 0u64;
        let mut warnings = Vec::new();

        for entry_result in walker {
            if expired.load(Ordering::Relaxed) || self.clock.now() >= deadline {
                warn!(root = %root.display(), files = paths.len(), "traversal deadline exceeded");
                return Err(deadline_error());
            }

            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    let warning = match err.io_error() {
                        Some(io) => WalkWarning::read_error(path, io),
                        None => WalkWarning::new(path, err.to_string(), WarningKind::ReadError),
                    };
                    warn!(path = %warning.path.display(), "{}", warning.message);
                    warnings.push(warning);
                    continue;
                }
            };

            if entry.depth() == 0 {
                continue;
            }

            let file_type = entry.file_type();
            if file_type.is_dir() {
                dirs_visited += 1;
                continue;
            }
            if !(file_type.is_file() || file_type.is_symlink()) {
                debug!(path = %entry.path().display(), "skipping special file");
                continue;
            }

            let path = entry.path();
            let Some(relative) = RelativePath::strip_root(&root, &path) else {
                warnings.push(WalkWarning::new(
                    &path,
                    "Path is outside the traversal root or not valid UTF-8",
                    WarningKind::InvalidPath,
                ));
                continue;
            };

            paths.insert(relative);
            if paths.len() > config.file_limit {
                warn!(root = %root.display(), limit = config.file_limit, "file limit exceeded");
                return Err(SyncError::LimitExceeded {
                    limit: config.file_limit,
                });
            }
        }

        // The walk can drain early when the deadline fires inside a directory read.
        if expired.load(Ordering::Relaxed) {
            return Err(deadline_error());
        }

        let duration = self.clock.now().saturating_duration_since(start);
        info!(
            root = %root.display(),
            files = paths.len(),
            dirs = dirs_visited,
            elapsed_ms = duration.as_millis() as u64,
            "traversal complete"
        );

        Ok(FileList {
            root,
            paths,
            dirs_visited,
            warnings,
            duration,
        })
    }

    fn build_walker(
        &self,
        config: &TraversalConfig,
        root: &Path,
        deadline: Instant,
        expired: Arc<AtomicBool>,
    ) -> WalkDir {
        let parallelism = match config.threads {
            0 => Parallelism::RayonDefaultPool {
                busy_timeout: Duration::from_millis(100),
            },
            n => Parallelism::RayonNewPool(n),
        };

        let clock = Arc::clone(&self.clock);
        let matcher = Arc::clone(&config.ignore);
        let walk_root: Arc<Path> = Arc::from(root);

        WalkDir::new(root)
            .parallelism(parallelism)
            .skip_hidden(false)
            .follow_links(false)
            .sort(true)
            .process_read_dir(move |_depth, _dir, _state, children| {
                if expired.load(Ordering::Relaxed) || clock.now() >= deadline {
                    expired.store(true, Ordering::Relaxed);
                    children.clear();
                    return;
                }
                // Dropping an ignored directory here keeps jwalk from ever
                // reading its contents.
                children.retain(|child| match child {
                    Ok(entry) => match RelativePath::strip_root(&walk_root, &entry.path()) {
                        Some(relative) => !matcher.is_ignored(relative.as_str()),
                        None => true,
                    },
                    Err(_) => true,
                });
            })
    }
}

impl Default for TreeWalker {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}
