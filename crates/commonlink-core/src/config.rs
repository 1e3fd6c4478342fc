//! Sync configuration types.

use std::path::PathBuf;

use derive_builder::Builder;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::env::Environment;
use crate::error::SyncError;

/// Patterns that are always ignored.
pub const DEFAULT_IGNORED: &[&str] = &[".git", "*node_modules*", "dist"];

/// Gitignore-like files that are always consulted when present.
pub const DEFAULT_GITIGNORE_FILES: &[&str] = &[".gitignore", "~/.gitignore"];

/// Default ceiling on the number of files a traversal may discover.
pub const DEFAULT_FILE_LIMIT: usize = 500;

/// Default traversal deadline in seconds.
pub const DEFAULT_TIME_LIMIT: u64 = 10;

const MAX_CONCURRENCY: usize = 64;

/// Configuration for one link or unlink run.
///
/// Built once per invocation and read-only afterwards. Building through
/// [`SyncConfigBuilder`] merges the built-in ignore patterns and gitignore
/// files into the user-supplied lists, so consumers never repeat that step.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(
    setter(into),
    build_fn(private, name = "build_unmerged", validate = "Self::validate")
)]
pub struct SyncConfig {
    /// Source-of-truth tree whose files get linked into the project.
    pub common_dir: PathBuf,

    /// Tree receiving the links.
    #[builder(default = "PathBuf::from(\".\")")]
    #[serde(default = "default_project_dir")]
    pub project_dir: PathBuf,

    /// Ignore patterns (glob, wildcard or plain substring).
    #[builder(default)]
    #[serde(default)]
    pub ignored: Vec<String>,

    /// Gitignore-like files to read more patterns from.
    #[builder(default)]
    #[serde(default)]
    pub gitignore_files: Vec<PathBuf>,

    /// Maximum number of files a traversal may discover.
    #[builder(default = "DEFAULT_FILE_LIMIT")]
    #[serde(default = "default_file_limit")]
    pub file_limit: usize,

    /// Traversal deadline in seconds.
    #[builder(default = "DEFAULT_TIME_LIMIT")]
    #[serde(default = "default_time_limit")]
    pub time_limit: u64,

    /// Report what would happen without touching the filesystem.
    #[builder(default)]
    #[serde(default)]
    pub dry_run: bool,

    /// Answer the final confirmation with yes without asking.
    #[builder(default)]
    #[serde(default)]
    pub auto_confirm: bool,

    /// Skip the uncommitted-changes check.
    #[builder(default)]
    #[serde(default)]
    pub skip_dirty_check: bool,

    /// Upper bound on concurrent per-file workers.
    #[builder(default = "default_concurrency()")]
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_project_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_file_limit() -> usize {
    DEFAULT_FILE_LIMIT
}

fn default_time_limit() -> u64 {
    DEFAULT_TIME_LIMIT
}

/// Number of available CPUs, clamped to a sane worker count.
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .clamp(1, MAX_CONCURRENCY)
}

impl SyncConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.common_dir {
            Some(ref dir) if dir.as_os_str().is_empty() => {
                return Err("commonDir cannot be empty".to_string());
            }
            Some(_) => {}
            None => {
                return Err(
                    "Required argument missing: --common-dir=\"xxx\", -c \"xxx\", or 1st argument"
                        .to_string(),
                );
            }
        }
        if self.file_limit == Some(0) {
            return Err("fileLimit must be at least 1".to_string());
        }
        if self.time_limit == Some(0) {
            return Err("timeLimit must be at least 1 second".to_string());
        }
        if self.concurrency == Some(0) {
            return Err("concurrency must be at least 1".to_string());
        }
        Ok(())
    }

    /// Build the config, merging the built-in defaults into the pattern and
    /// gitignore-file lists.
    pub fn build(&self) -> Result<SyncConfig, SyncConfigBuilderError> {
        self.build_unmerged().map(SyncConfig::with_defaults)
    }
}

impl From<SyncConfigBuilderError> for SyncError {
    fn from(err: SyncConfigBuilderError) -> Self {
        SyncError::invalid_config(err.to_string())
    }
}

/// Absolute directories derived from a [`SyncConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDirs {
    /// Absolute common directory.
    pub common_dir: PathBuf,
    /// Absolute project directory.
    pub project_dir: PathBuf,
    /// Candidate gitignore-like files, absolute and de-duplicated. Missing
    /// files are expected and skipped by readers.
    pub gitignore_files: Vec<PathBuf>,
}

impl SyncConfig {
    /// Create a new config builder.
    pub fn builder() -> SyncConfigBuilder {
        SyncConfigBuilder::default()
    }

    /// Prepend the built-in ignore patterns and gitignore files, removing
    /// duplicates while keeping first-seen order. Idempotent.
    ///
    /// Configs deserialized by an external loader should pass through here
    /// once before use.
    pub fn with_defaults(mut self) -> Self {
        let ignored: IndexSet<String> = DEFAULT_IGNORED
            .iter()
            .map(|p| p.to_string())
            .chain(self.ignored)
            .collect();
        self.ignored = ignored.into_iter().collect();

        let gitignore: IndexSet<PathBuf> = DEFAULT_GITIGNORE_FILES
            .iter()
            .map(PathBuf::from)
            .chain(self.gitignore_files)
            .collect();
        self.gitignore_files = gitignore.into_iter().collect();
        self
    }

    /// Resolve directories against the environment and check that common
    /// and project differ.
    ///
    /// Relative gitignore entries are looked up in both the common and the
    /// project directory; `~` expands to the environment's home.
    pub fn resolve(&self, env: &Environment) -> Result<ResolvedDirs, SyncError> {
        if self.common_dir.as_os_str().is_empty() {
            return Err(SyncError::invalid_config("commonDir cannot be empty"));
        }

        let common_dir = env.resolve(&self.common_dir);
        let project_dir = env.resolve(&self.project_dir);

        let same = common_dir == project_dir
            || matches!(
                (common_dir.canonicalize(), project_dir.canonicalize()),
                (Ok(a), Ok(b)) if a == b
            );
        if same {
            return Err(SyncError::SameDirectory {
                common: self.common_dir.clone(),
                project: self.project_dir.clone(),
            });
        }

        let mut gitignore_files = IndexSet::new();
        for file in &self.gitignore_files {
            let expanded = env.expand_tilde(file);
            if expanded.is_absolute() {
                gitignore_files.insert(expanded);
            } else {
                gitignore_files.insert(common_dir.join(&expanded));
                gitignore_files.insert(project_dir.join(&expanded));
            }
        }

        Ok(ResolvedDirs {
            common_dir,
            project_dir,
            gitignore_files: gitignore_files.into_iter().collect(),
        })
    }
}
