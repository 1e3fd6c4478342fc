//! Root-relative path type.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// A `/`-separated path relative to a traversal root.
///
/// Independent of the host separator so the same value addresses a file in
/// both the common and the project tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelativePath(CompactString);

impl RelativePath {
    /// Create a relative path from a string, normalizing `\` to `/` and
    /// dropping empty and `.` segments.
    pub fn new(path: impl AsRef<str>) -> Self {
        let normalized = path
            .as_ref()
            .split(['/', '\\'])
            .filter(|segment| !segment.is_empty() && *segment != ".")
            .collect::<Vec<_>>()
            .join("/");
        Self(CompactString::from(normalized))
    }

    /// Build a relative path from a filesystem path.
    ///
    /// Returns `None` for paths that are absolute, climb out of the root or
    /// contain a segment that is not valid UTF-8.
    pub fn from_path(path: &Path) -> Option<Self> {
        let mut out = CompactString::default();
        for component in path.components() {
            match component {
                Component::Normal(segment) => {
                    if !out.is_empty() {
                        out.push('/');
                    }
                    out.push_str(segment.to_str()?);
                }
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        Some(Self(out))
    }

    /// Express `path` relative to `root`.
    pub fn strip_root(root: &Path, path: &Path) -> Option<Self> {
        path.strip_prefix(root).ok().and_then(Self::from_path)
    }

    /// The path as a `/`-separated string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Whether this is the root itself.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Final segment of the path.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or("")
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        if self.0.is_empty() {
            0
        } else {
            self.0.split('/').count()
        }
    }

    /// Convert to a host path (still relative).
    pub fn to_path(&self) -> PathBuf {
        self.0.split('/').filter(|s| !s.is_empty()).collect()
    }

    /// Join onto a root directory.
    pub fn resolve(&self, root: &Path) -> PathBuf {
        root.join(self.to_path())
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RelativePath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<&str> for RelativePath {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_separators() {
        let path = RelativePath::new("./src\\lib//mod.rs");
        assert_eq!(path.as_str(), "src/lib/mod.rs");
        assert_eq!(path.file_name(), "mod.rs");
        assert_eq!(path.depth(), 3);
    }

    #[test]
    fn test_strip_root() {
        let root = Path::new("/repo/common");
        let rel = RelativePath::strip_root(root, Path::new("/repo/common/a/b.txt")).unwrap();
        assert_eq!(rel.as_str(), "a/b.txt");

        assert!(RelativePath::strip_root(root, Path::new("/elsewhere/b.txt")).is_none());
        assert!(RelativePath::from_path(Path::new("../escape")).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_from_path_rejects_non_utf8() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let name = OsStr::from_bytes(b"caf\xe9.txt");
        assert!(RelativePath::from_path(&Path::new("dir").join(name)).is_none());
        assert!(RelativePath::strip_root(Path::new("/r"), &Path::new("/r").join(name)).is_none());
    }

    #[test]
    fn test_resolve() {
        let rel = RelativePath::new("a/b.txt");
        assert_eq!(
            rel.resolve(Path::new("/project")),
            Path::new("/project").join("a").join("b.txt")
        );
    }
}
