//! Orchestrator states.

use serde::{Deserialize, Serialize};
use strum::Display;

/// A state of one sync run.
///
/// Runs move forward through `Idle → Walking → Classifying →
/// AwaitingConfirmation → Mutating → Done`, skipping states that do not
/// apply. `Failed` is reachable from every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SyncState {
    Idle,
    Walking,
    Classifying,
    AwaitingConfirmation,
    Mutating,
    Done,
    Failed,
}

impl SyncState {
    /// Whether no further transition is allowed.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: SyncState) -> bool {
        use SyncState::*;

        match (self, next) {
            (from, _) if from.is_terminal() => false,
            (_, Failed) => true,
            (Idle, Walking) => true,
            (Walking, Classifying) => true,
            (Classifying, AwaitingConfirmation | Mutating | Done) => true,
            (AwaitingConfirmation, Mutating | Done) => true,
            (Mutating, Done) => true,
            _ => false,
        }
    }
}
