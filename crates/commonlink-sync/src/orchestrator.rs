//! The link/unlink state machine.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use commonlink_analyze::{Classifier, ClassifierConfig, DEFAULT_CHUNK_SIZE};
use commonlink_core::{
    Classification, Environment, RelativePath, ResolvedDirs, SyncConfig, SyncError,
};
use commonlink_ops::{MutationOptions, OperationComplete, drain_results, start_link, start_unlink};
use commonlink_scan::{FileList, IgnoreMatcher, TraversalConfig, TreeWalker};

use crate::confirm::{Confirm, FixedAnswer};
use crate::dirty::{DirtyCheck, GitStatusCheck};
use crate::observer::{NoopObserver, SyncObserver};
use crate::operation::Operation;
use crate::report::{SyncOutcome, SyncPlan, SyncReport};
use crate::state::SyncState;

const PROCEED_PROMPT: &str = "Proceed";
const DIRTY_PROMPT: &str = "projectDir has uncommitted changes. Proceed anyway";
const CHECK_FAILED_PROMPT: &str = "Git check failed. Proceed anyway";

/// Runs the link and unlink workflows.
///
/// A run walks the relevant tree, classifies what it found, reports the
/// plan to the observer, asks for confirmation and finally mutates. Any
/// fatal error moves the run to [`SyncState::Failed`] before mutation.
///
/// Collaborators default to non-interactive implementations: confirmation
/// is always declined and the dirty check queries git.
pub struct SyncOrchestrator {
    config: SyncConfig,
    env: Environment,
    confirm: Arc<dyn Confirm>,
    dirty_check: Arc<dyn DirtyCheck>,
    observer: Arc<dyn SyncObserver>,
}

impl SyncOrchestrator {
    /// Create an orchestrator with default collaborators.
    pub fn new(config: SyncConfig, env: Environment) -> Self {
        Self {
            config,
            env,
            confirm: Arc::new(FixedAnswer(false)),
            dirty_check: Arc::new(GitStatusCheck),
            observer: Arc::new(NoopObserver),
        }
    }

    /// Set the confirmation collaborator.
    pub fn with_confirm(mut self, confirm: Arc<dyn Confirm>) -> Self {
        self.confirm = confirm;
        self
    }

    /// Set the dirty-check collaborator.
    pub fn with_dirty_check(mut self, dirty_check: Arc<dyn DirtyCheck>) -> Self {
        self.dirty_check = dirty_check;
        self
    }

    /// Set the observer.
    pub fn with_observer(mut self, observer: Arc<dyn SyncObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// The configuration this orchestrator runs with.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Run one workflow to completion.
    ///
    /// Returns a report for every run that reaches `Done`, including dry
    /// runs, declined confirmations and runs with nothing to do.
    pub async fn run(&self, operation: Operation) -> Result<SyncReport, SyncError> {
        let mut states = Transitions::new(operation, self.observer.as_ref());
        match self.execute(operation, &mut states).await {
            Ok(report) => Ok(report),
            Err(err) => {
                warn!(%operation, error = %err, "sync failed");
                states.advance(SyncState::Failed);
                Err(err)
            }
        }
    }

    async fn execute(
        &self,
        operation: Operation,
        states: &mut Transitions<'_>,
    ) -> Result<SyncReport, SyncError> {
        let dirs = self.config.resolve(&self.env)?;

        if self.config.skip_dirty_check {
            debug!("dirty check skipped");
        } else {
            self.check_dirty(&dirs.project_dir)?;
        }

        states.advance(SyncState::Walking);
        let files = self.walk(operation, &dirs).await?;
        info!(%operation, files = files.len(), "files found");

        states.advance(SyncState::Classifying);
        let classification = self.classify(operation, &dirs, files.to_vec()).await?;

        let plan = SyncPlan {
            operation,
            dirs,
            files_found: files.len(),
            warnings: files.warnings,
            classification,
        };
        self.observer.on_plan(&plan);

        let targets = plan.targets();
        if targets.is_empty() {
            return Ok(finish(states, plan, SyncOutcome::NothingToDo, None));
        }
        if self.config.dry_run {
            return Ok(finish(states, plan, SyncOutcome::DryRun, None));
        }
        if !self.config.auto_confirm {
            states.advance(SyncState::AwaitingConfirmation);
            if !self.confirm.confirm(PROCEED_PROMPT, true)? {
                return Ok(finish(states, plan, SyncOutcome::Declined, None));
            }
        }

        states.advance(SyncState::Mutating);
        let complete = self.mutate(operation, &plan.dirs, targets).await?;
        Ok(finish(states, plan, SyncOutcome::Completed, Some(complete)))
    }

    fn check_dirty(&self, project_dir: &Path) -> Result<(), SyncError> {
        match self.dirty_check.is_dirty(project_dir) {
            Ok(false) => {
                debug!(dir = %project_dir.display(), "working tree clean");
                Ok(())
            }
            Ok(true) => {
                if self.ask_override(DIRTY_PROMPT)? {
                    warn!(dir = %project_dir.display(), "proceeding with uncommitted changes");
                    Ok(())
                } else {
                    Err(SyncError::DirtyWorkingTree {
                        path: project_dir.to_path_buf(),
                    })
                }
            }
            Err(message) => {
                warn!(dir = %project_dir.display(), error = %message, "dirty check failed");
                if self.ask_override(CHECK_FAILED_PROMPT)? {
                    Ok(())
                } else {
                    Err(SyncError::DirtyCheckFailed {
                        path: project_dir.to_path_buf(),
                        message,
                    })
                }
            }
        }
    }

    /// Auto-confirm answers the final prompt only; overrides stay explicit.
    fn ask_override(&self, prompt: &str) -> Result<bool, SyncError> {
        if self.config.auto_confirm {
            return Ok(false);
        }
        self.confirm.confirm(prompt, false)
    }

    async fn walk(&self, operation: Operation, dirs: &ResolvedDirs) -> Result<FileList, SyncError> {
        let ignored = self.config.ignored.clone();
        let gitignore_files = dirs.gitignore_files.clone();
        let root = operation.walk_root(dirs).to_path_buf();
        let file_limit = self.config.file_limit;
        let time_limit = self.config.time_limit;
        let threads = self.config.concurrency;
        let clock = Arc::clone(&self.env.clock);

        tokio::task::spawn_blocking(move || {
            let ignore = IgnoreMatcher::from_sources(&ignored, &gitignore_files)?;
            debug!(rules = ignore.len(), "ignore rules compiled");

            let config = TraversalConfig::builder()
                .root(root)
                .ignore(ignore)
                .file_limit(file_limit)
                .time_limit(time_limit)
                .threads(threads)
                .build()
                .map_err(|e| SyncError::invalid_config(e.to_string()))?;
            TreeWalker::new(clock).walk(&config)
        })
        .await
        .map_err(SyncError::internal)?
    }

    async fn classify(
        &self,
        operation: Operation,
        dirs: &ResolvedDirs,
        paths: Vec<RelativePath>,
    ) -> Result<Classification, SyncError> {
        let classifier = Classifier::with_config(ClassifierConfig {
            concurrency: self.config.concurrency,
            chunk_size: DEFAULT_CHUNK_SIZE,
        });
        let common_dir = dirs.common_dir.clone();
        let project_dir = dirs.project_dir.clone();

        tokio::task::spawn_blocking(move || match operation {
            Operation::Link => classifier.classify(&paths, &common_dir, &project_dir),
            Operation::Unlink => classifier.find_linked(&paths, &common_dir, &project_dir),
        })
        .await
        .map_err(SyncError::internal)?
    }

    async fn mutate(
        &self,
        operation: Operation,
        dirs: &ResolvedDirs,
        targets: Vec<RelativePath>,
    ) -> Result<OperationComplete, SyncError> {
        let options = MutationOptions {
            concurrency: self.config.concurrency,
        };
        let rx = match operation {
            Operation::Link => start_link(
                targets,
                dirs.common_dir.clone(),
                dirs.project_dir.clone(),
                options,
            ),
            Operation::Unlink => start_unlink(targets, dirs.project_dir.clone(), options),
        };

        let observer = Arc::clone(&self.observer);
        drain_results(rx, |progress| observer.on_progress(progress))
            .await
            .ok_or_else(|| SyncError::internal("operation ended without a completion record"))
    }
}

fn finish(
    states: &mut Transitions<'_>,
    plan: SyncPlan,
    outcome: SyncOutcome,
    mutation: Option<OperationComplete>,
) -> SyncReport {
    states.advance(SyncState::Done);
    info!(
        operation = %plan.operation,
        %outcome,
        succeeded = mutation.as_ref().map(|m| m.succeeded).unwrap_or(0),
        failed = mutation.as_ref().map(|m| m.failed).unwrap_or(0),
        "sync finished"
    );
    SyncReport {
        operation: plan.operation,
        outcome,
        plan,
        mutation,
        states: states.history.clone(),
    }
}

/// Current state plus history, announcing each change.
struct Transitions<'a> {
    operation: Operation,
    current: SyncState,
    history: Vec<SyncState>,
    observer: &'a dyn SyncObserver,
}

impl<'a> Transitions<'a> {
    fn new(operation: Operation, observer: &'a dyn SyncObserver) -> Self {
        Self {
            operation,
            current: SyncState::Idle,
            history: vec![SyncState::Idle],
            observer,
        }
    }

    fn advance(&mut self, next: SyncState) {
        let from = self.current;
        debug_assert!(from.can_transition_to(next), "illegal transition {from} -> {next}");
        info!(operation = %self.operation, %from, to = %next, "state transition");
        self.observer.on_transition(from, next);
        self.current = next;
        self.history.push(next);
    }
}
