//! Plan and report types produced by a sync run.

use serde::Serialize;
use strum::Display;

use commonlink_core::{Classification, RelativePath, ResolvedDirs, WalkWarning};
use commonlink_ops::OperationComplete;

use crate::operation::Operation;
use crate::state::SyncState;

/// What a run found and intends to do, reported before any mutation.
#[derive(Debug, Clone, Serialize)]
pub struct SyncPlan {
    /// The workflow.
    pub operation: Operation,
    /// Resolved directories.
    pub dirs: ResolvedDirs,
    /// Number of files the traversal found.
    pub files_found: usize,
    /// Non-fatal traversal problems.
    pub warnings: Vec<WalkWarning>,
    /// Classification of the found files.
    ///
    /// For unlink only `linked` and `errors` are filled; files that are
    /// not links of a common file are left out.
    pub classification: Classification,
}

impl SyncPlan {
    /// Paths the mutation step acts on.
    pub fn targets(&self) -> Vec<RelativePath> {
        match self.operation {
            Operation::Link => self.classification.linkable(),
            Operation::Unlink => self.classification.linked.clone(),
        }
    }
}

/// How a run that did not fail ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SyncOutcome {
    /// Mutation ran; per-path failures are in the mutation record.
    Completed,
    /// Dry run; nothing was changed.
    DryRun,
    /// The confirmation was declined; nothing was changed.
    Declined,
    /// No eligible files; nothing was changed.
    NothingToDo,
}

/// Final report of a run that reached `Done`.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub operation: Operation,
    pub outcome: SyncOutcome,
    pub plan: SyncPlan,
    /// Present only when the mutation step ran.
    pub mutation: Option<OperationComplete>,
    /// Every state the run passed through, in order.
    pub states: Vec<SyncState>,
}

impl SyncReport {
    /// Whether any path failed to mutate.
    pub fn has_mutation_errors(&self) -> bool {
        self.mutation.as_ref().is_some_and(|m| !m.is_success())
    }

    /// Process exit code for this report.
    pub fn exit_code(&self) -> i32 {
        if self.has_mutation_errors() { 1 } else { 0 }
    }
}

/// Up to `size` items spread evenly across `items`, in order.
pub fn sample<T: Clone>(items: &[T], size: usize) -> Vec<T> {
    if items.len() <= size {
        return items.to_vec();
    }
    (0..size).map(|i| items[i * items.len() / size].clone()).collect()
}
