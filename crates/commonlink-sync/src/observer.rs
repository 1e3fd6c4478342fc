//! Hooks for watching a sync run.

use commonlink_ops::OperationProgress;

use crate::report::SyncPlan;
use crate::state::SyncState;

/// Receives events from a running [`SyncOrchestrator`](crate::SyncOrchestrator).
///
/// Every method has an empty default so implementors pick what they need.
pub trait SyncObserver: Send + Sync {
    /// Called on every state change, including into `Failed`.
    fn on_transition(&self, _from: SyncState, _to: SyncState) {}

    /// Called once the plan is known, before confirmation or mutation.
    fn on_plan(&self, _plan: &SyncPlan) {}

    /// Called after each path is mutated.
    fn on_progress(&self, _progress: &OperationProgress) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SyncObserver for NoopObserver {}
