//! Ignore rules compiled from explicit patterns and gitignore-like files.
//!
//! Matching is deliberately broad. A rule matches a relative path when any
//! of these hold:
//!
//! 1. the path contains the pattern as a substring,
//! 2. the pattern matches as a shell glob whose `*` and `?` stay inside one
//!    path segment,
//! 3. the pattern matches as a wildcard whose `*` may span segments.
//!
//! Rules are evaluated in order and the last matching rule decides: a plain
//! rule ignores the path, a `!rule` re-includes it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use tracing::{debug, warn};

use commonlink_core::SyncError;

/// One compiled ignore pattern.
#[derive(Debug, Clone)]
pub struct IgnoreRule {
    pattern: String,
    negated: bool,
    anchored: Option<GlobMatcher>,
    unanchored: Option<GlobMatcher>,
}

impl IgnoreRule {
    /// Parse one pattern line.
    ///
    /// Returns `None` for blank lines, comments and patterns that reduce to
    /// nothing once the root anchor and directory marker are stripped.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let (negated, body) = match line.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, line),
        };
        let body = body
            .strip_prefix("\\#")
            .map(|rest| format!("#{rest}"))
            .or_else(|| body.strip_prefix("\\!").map(|rest| format!("!{rest}")))
            .unwrap_or_else(|| body.to_string());

        let pattern = body.trim_start_matches('/').trim_end_matches('/').to_string();
        if pattern.is_empty() {
            return None;
        }

        let anchored = compile_glob(&pattern, true);
        let unanchored = compile_glob(&pattern, false);

        Some(Self {
            pattern,
            negated,
            anchored,
            unanchored,
        })
    }

    /// The pattern text without the `!` prefix.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether this rule re-includes matching paths.
    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// Whether the rule's pattern matches a relative path.
    pub fn matches(&self, path: &str) -> bool {
        path.contains(self.pattern.as_str())
            || self.anchored.as_ref().is_some_and(|g| g.is_match(path))
            || self.unanchored.as_ref().is_some_and(|g| g.is_match(path))
    }
}

fn compile_glob(pattern: &str, literal_separator: bool) -> Option<GlobMatcher> {
    match GlobBuilder::new(pattern)
        .literal_separator(literal_separator)
        .backslash_escape(true)
        .build()
    {
        Ok(glob) => Some(glob.compile_matcher()),
        Err(err) => {
            warn!(pattern, error = %err, "invalid glob; falling back to substring matching");
            None
        }
    }
}

/// Ordered set of ignore rules acting as a predicate over relative paths.
#[derive(Debug, Clone, Default)]
pub struct IgnoreMatcher {
    rules: Vec<IgnoreRule>,
}

impl IgnoreMatcher {
    /// Create a matcher that ignores nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile patterns in order. Blank and comment entries are skipped.
    pub fn compile<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = patterns
            .into_iter()
            .filter_map(|p| IgnoreRule::parse(p.as_ref()))
            .collect();
        Self { rules }
    }

    /// Compile explicit patterns followed by the lines of every gitignore
    /// file that exists. Missing files are skipped.
    pub fn from_sources(explicit: &[String], gitignore_files: &[PathBuf]) -> Result<Self, SyncError> {
        let mut patterns: Vec<String> = explicit.to_vec();
        for file in gitignore_files {
            match read_gitignore(file)? {
                Some(lines) => {
                    debug!(file = %file.display(), rules = lines.len(), "loaded ignore file");
                    patterns.extend(lines);
                }
                None => debug!(file = %file.display(), "ignore file not present"),
            }
        }
        Ok(Self::compile(patterns))
    }

    /// Whether a relative path is ignored.
    pub fn is_ignored(&self, path: &str) -> bool {
        if path.is_empty() {
            return false;
        }
        self.rules
            .iter()
            .rev()
            .find(|rule| rule.matches(path))
            .is_some_and(|rule| !rule.negated)
    }

    /// The compiled rules, in evaluation order.
    pub fn rules(&self) -> &[IgnoreRule] {
        &self.rules
    }

    /// Number of compiled rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if there are no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Extract pattern lines from gitignore-like content.
pub fn parse_gitignore(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Read and parse a gitignore-like file. Returns `None` if it does not exist.
pub fn read_gitignore(path: &Path) -> Result<Option<Vec<String>>, SyncError> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(parse_gitignore(&contents))),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) if err.kind() == io::ErrorKind::IsADirectory => Ok(None),
        Err(err) => Err(SyncError::io(path, err)),
    }
}
