//! Injectable process environment.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Source of monotonic time for deadlines.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current instant.
    fn now(&self) -> Instant;
}

/// Clock backed by [`Instant::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Working directory, home directory and clock for one invocation.
///
/// Core logic reads these from here instead of from process globals so
/// tests can run against fixtures.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Directory relative paths are resolved against.
    pub cwd: PathBuf,
    /// Home directory used for `~` expansion.
    pub home: Option<PathBuf>,
    /// Clock for traversal deadlines.
    pub clock: Arc<dyn Clock>,
}

impl Environment {
    /// Create an environment with the system clock.
    pub fn new(cwd: impl Into<PathBuf>, home: Option<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            home,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Expand a leading `~` to the home directory.
    ///
    /// Paths are returned unchanged when no home directory is known.
    pub fn expand_tilde(&self, path: &Path) -> PathBuf {
        let Some(home) = &self.home else {
            return path.to_path_buf();
        };
        match path.strip_prefix("~") {
            Ok(rest) => home.join(rest),
            Err(_) => path.to_path_buf(),
        }
    }

    /// Expand `~`, anchor relative paths at the working directory and
    /// normalize `.` and `..` lexically.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        let expanded = self.expand_tilde(path);
        let absolute = if expanded.is_absolute() {
            expanded
        } else {
            self.cwd.join(expanded)
        };
        normalize(&absolute)
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
