//! Four-way classification of project files against the common tree.
//!
//! Each path is checked independently on a dedicated rayon pool:
//! 1. No project entry: `no_exist`
//! 2. Same device and inode on both sides: `linked` (never read)
//! 3. Otherwise a streaming content comparison decides `same` or `different`

use std::fs;
use std::io;
use std::path::Path;
use std::time::Instant;

use derive_builder::Builder;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use commonlink_core::{
    Category, Classification, InodeInfo, PathError, RelativePath, SyncError, default_concurrency,
};

use crate::compare::{DEFAULT_CHUNK_SIZE, compare_files};

/// Configuration for classification.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ClassifierConfig {
    /// Number of worker threads.
    #[builder(default = "default_concurrency()")]
    pub concurrency: usize,

    /// Buffer size for content comparison.
    #[builder(default = "DEFAULT_CHUNK_SIZE")]
    pub chunk_size: usize,
}

impl ClassifierConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.concurrency == Some(0) {
            return Err("concurrency must be at least 1".to_string());
        }
        if self.chunk_size == Some(0) {
            return Err("chunk_size must be at least 1".to_string());
        }
        Ok(())
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ClassifierConfig {
    /// Create a new config builder.
    pub fn builder() -> ClassifierConfigBuilder {
        ClassifierConfigBuilder::default()
    }
}

/// Outcome of checking one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Verdict {
    category: Category,
    bytes_compared: u64,
}

impl Verdict {
    fn without_read(category: Category) -> Self {
        Self {
            category,
            bytes_compared: 0,
        }
    }
}

/// Classifies relative paths by comparing project files to common files.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    config: ClassifierConfig,
}

impl Classifier {
    /// Create a classifier with default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a classifier with custom config.
    pub fn with_config(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Classify every path.
    ///
    /// Each input path ends up in exactly one category list or in the error
    /// list. Category lists keep the input order.
    pub fn classify(
        &self,
        paths: &[RelativePath],
        common_dir: &Path,
        project_dir: &Path,
    ) -> Result<Classification, SyncError> {
        let start = Instant::now();
        let verdicts = self.run_pooled(paths, |path| {
            self.classify_path(path, common_dir, project_dir)
        })?;

        let mut classification = Classification::new();
        for (path, verdict) in paths.iter().zip(verdicts) {
            match verdict {
                Ok(verdict) => {
                    debug!(path = %path, category = %verdict.category, "classified");
                    classification.bytes_compared += verdict.bytes_compared;
                    classification.push(verdict.category, path.clone());
                }
                Err(err) => {
                    warn!(path = %path, error = %err, "classification failed");
                    classification
                        .errors
                        .push(PathError::new(path.clone(), err.to_string()));
                }
            }
        }

        info!(
            linked = classification.linked.len(),
            same = classification.same.len(),
            different = classification.different.len(),
            no_exist = classification.no_exist.len(),
            errors = classification.errors.len(),
            bytes_compared = classification.bytes_compared,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "classification complete"
        );
        Ok(classification)
    }

    /// Select the paths whose project file is a hardlink of its common
    /// counterpart.
    ///
    /// Only identity is checked; no content is read. The result carries
    /// the matches in `linked` and per-path failures in `errors`. Paths
    /// that are not linked, including those with no common counterpart,
    /// are left out.
    pub fn find_linked(
        &self,
        paths: &[RelativePath],
        common_dir: &Path,
        project_dir: &Path,
    ) -> Result<Classification, SyncError> {
        let verdicts = self.run_pooled(paths, |path| {
            is_linked(&path.resolve(common_dir), &path.resolve(project_dir))
        })?;

        let mut classification = Classification::new();
        for (path, verdict) in paths.iter().zip(verdicts) {
            match verdict {
                Ok(true) => classification.push(Category::Linked, path.clone()),
                Ok(false) => {}
                Err(err) => {
                    warn!(path = %path, error = %err, "identity check failed");
                    classification
                        .errors
                        .push(PathError::new(path.clone(), err.to_string()));
                }
            }
        }

        info!(
            candidates = paths.len(),
            linked = classification.linked.len(),
            errors = classification.errors.len(),
            "linked files selected"
        );
        Ok(classification)
    }

    fn run_pooled<T, F>(&self, paths: &[RelativePath], check: F) -> Result<Vec<T>, SyncError>
    where
        T: Send,
        F: Fn(&RelativePath) -> T + Sync,
    {
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.config.concurrency.max(1))
            .thread_name(|i| format!("commonlink-classify-{i}"))
            .build()
            .map_err(SyncError::internal)?;

        Ok(pool.install(|| paths.par_iter().map(|path| check(path)).collect()))
    }

    fn classify_path(
        &self,
        path: &RelativePath,
        common_dir: &Path,
        project_dir: &Path,
    ) -> io::Result<Verdict> {
        let project_path = path.resolve(project_dir);
        let project_meta = match fs::symlink_metadata(&project_path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(Verdict::without_read(Category::NoExist));
            }
            Err(e) => return Err(e),
        };

        let common_path = path.resolve(common_dir);
        let common_meta = fs::symlink_metadata(&common_path)?;

        if InodeInfo::same(&common_meta, &project_meta) {
            return Ok(Verdict::without_read(Category::Linked));
        }

        // Symlinks are leaves: compare where they point, never what they
        // point at.
        let common_link = common_meta.file_type().is_symlink();
        let project_link = project_meta.file_type().is_symlink();
        if common_link || project_link {
            let equal = common_link
                && project_link
                && fs::read_link(&common_path)? == fs::read_link(&project_path)?;
            return Ok(Verdict::without_read(if equal {
                Category::Same
            } else {
                Category::Different
            }));
        }

        let comparison = compare_files(&common_path, &project_path, self.config.chunk_size)?;
        Ok(Verdict {
            category: if comparison.equal {
                Category::Same
            } else {
                Category::Different
            },
            bytes_compared: comparison.bytes_compared,
        })
    }
}

fn is_linked(common_path: &Path, project_path: &Path) -> io::Result<bool> {
    let project_meta = fs::symlink_metadata(project_path)?;
    if !project_meta.is_file() {
        return Ok(false);
    }
    match fs::symlink_metadata(common_path) {
        Ok(common_meta) => Ok(InodeInfo::same(&common_meta, &project_meta)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
