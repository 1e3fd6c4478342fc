//! Four-way classification of project paths against the common tree.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::error::PathError;
use crate::path::RelativePath;

/// How a project-side file relates to its common-side counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Category {
    /// Same device and inode: already a hardlink.
    Linked,
    /// Byte-for-byte identical but a distinct inode.
    Same,
    /// Content differs.
    Different,
    /// No file at the project path.
    NoExist,
}

impl Category {
    /// Short tag used when listing sample paths.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Linked => "[link]",
            Self::Same => "[same]",
            Self::Different => "[diff]",
            Self::NoExist => "[new] ",
        }
    }

    /// Whether the link workflow acts on paths in this category.
    pub fn is_linkable(&self) -> bool {
        matches!(self, Self::Same | Self::NoExist)
    }
}

/// Partition of a set of paths into the four categories.
///
/// Paths whose check failed land in `errors` instead, so every input path
/// appears exactly once across the category lists and the error list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Classification {
    pub linked: Vec<RelativePath>,
    pub same: Vec<RelativePath>,
    pub different: Vec<RelativePath>,
    pub no_exist: Vec<RelativePath>,
    /// Per-path failures, excluded from every category.
    pub errors: Vec<PathError>,
    /// Content bytes read while comparing files.
    pub bytes_compared: u64,
}

impl Classification {
    /// Create an empty classification.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a path under a category.
    pub fn push(&mut self, category: Category, path: RelativePath) {
        match category {
            Category::Linked => self.linked.push(path),
            Category::Same => self.same.push(path),
            Category::Different => self.different.push(path),
            Category::NoExist => self.no_exist.push(path),
        }
    }

    /// Paths in a category.
    pub fn get(&self, category: Category) -> &[RelativePath] {
        match category {
            Category::Linked => &self.linked,
            Category::Same => &self.same,
            Category::Different => &self.different,
            Category::NoExist => &self.no_exist,
        }
    }

    /// Paths the link workflow should act on: `same` followed by `no_exist`.
    pub fn linkable(&self) -> Vec<RelativePath> {
        self.same.iter().chain(&self.no_exist).cloned().collect()
    }

    /// Number of classified paths, excluding errors.
    pub fn classified_count(&self) -> usize {
        self.linked.len() + self.same.len() + self.different.len() + self.no_exist.len()
    }

    /// Number of classified paths plus errors.
    pub fn total(&self) -> usize {
        self.classified_count() + self.errors.len()
    }

    /// Whether any path failed to classify.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
