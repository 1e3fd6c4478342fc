//! Link and unlink workflows for commonlink.
//!
//! [`SyncOrchestrator`] composes traversal, classification and mutation
//! into a small state machine:
//!
//! ```text
//! Idle → Walking → Classifying → AwaitingConfirmation → Mutating → Done
//!   └──────────────── any fatal error ─────────────────→ Failed
//! ```
//!
//! Interaction with the outside world goes through collaborators: a
//! [`Confirm`] for yes/no questions, a [`DirtyCheck`] for uncommitted
//! changes and a [`SyncObserver`] for progress.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use commonlink_core::{Environment, SyncConfig};
//! use commonlink_sync::{Operation, SyncOrchestrator, TerminalConfirm};
//!
//! # async fn run() -> Result<(), commonlink_core::SyncError> {
//! let config = SyncConfig::builder().common_dir("../common").build()?;
//! let env = Environment::new(std::env::current_dir().unwrap(), None);
//!
//! let report = SyncOrchestrator::new(config, env)
//!     .with_confirm(Arc::new(TerminalConfirm))
//!     .run(Operation::Link)
//!     .await?;
//! println!("{}", report.outcome);
//! # Ok(())
//! # }
//! ```

mod confirm;
mod dirty;
mod observer;
mod operation;
mod orchestrator;
mod report;
mod state;

pub use confirm::{Confirm, FixedAnswer, TerminalConfirm};
pub use dirty::{DirtyCheck, GitStatusCheck};
pub use observer::{NoopObserver, SyncObserver};
pub use operation::Operation;
pub use orchestrator::SyncOrchestrator;
pub use report::{SyncOutcome, SyncPlan, SyncReport, sample};
pub use state::SyncState;
