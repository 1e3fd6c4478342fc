//! Bounded-concurrency batch runner shared by link and unlink.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use commonlink_core::RelativePath;

use crate::progress::{OperationComplete, OperationProgress, OperationType};
use crate::{OPERATION_CHANNEL_SIZE, OperationError};

/// Result sent through the channel during an operation.
#[derive(Debug)]
pub enum OperationResult {
    /// Progress update, sent after each path finishes.
    Progress(OperationProgress),
    /// The operation completed. Always the last message.
    Complete(OperationComplete),
}

/// Run `apply` on every path as a blocking task, at most `concurrency` at
/// a time, streaming progress and a final completion over a channel.
pub(crate) fn spawn_batch<F>(
    operation_type: OperationType,
    paths: Vec<RelativePath>,
    concurrency: usize,
    apply: F,
) -> mpsc::Receiver<OperationResult>
where
    F: Fn(&RelativePath) -> Result<u64, OperationError> + Send + Sync + 'static,
{
    let (tx, rx) = mpsc::channel(OPERATION_CHANNEL_SIZE);

    if paths.is_empty() {
        // Send immediate completion for empty input
        tokio::spawn(async move {
            let _ = tx
                .send(OperationResult::Complete(OperationComplete::empty(
                    operation_type,
                )))
                .await;
        });
        return rx;
    }

    tokio::spawn(async move {
        run_batch(operation_type, paths, concurrency, Arc::new(apply), tx).await;
    });

    rx
}

async fn run_batch<F>(
    operation_type: OperationType,
    paths: Vec<RelativePath>,
    concurrency: usize,
    apply: Arc<F>,
    tx: mpsc::Sender<OperationResult>,
) where
    F: Fn(&RelativePath) -> Result<u64, OperationError> + Send + Sync + 'static,
{
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut progress = OperationProgress::new(operation_type, paths.len());
    let mut succeeded = 0;
    let mut failed = 0;

    let mut tasks = JoinSet::new();
    let mut task_paths = HashMap::with_capacity(paths.len());
    for path in paths {
        let handle = tasks.spawn(run_one(path.clone(), Arc::clone(&apply), Arc::clone(&semaphore)));
        task_paths.insert(handle.id(), path);
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((path, Ok(bytes))) => {
                debug!(%operation_type, path = %path, bytes, "path done");
                progress.complete_file(bytes);
                progress.set_current_file(Some(path));
                succeeded += 1;
            }
            Ok((path, Err(error))) => {
                warn!(%operation_type, path = %path, error = %error.message, "path failed");
                progress.add_error(error);
                progress.set_current_file(Some(path));
                failed += 1;
            }
            Err(join_error) => {
                let path = task_paths.remove(&join_error.id()).unwrap_or_default();
                warn!(%operation_type, path = %path, error = %join_error, "worker task failed");
                progress.add_error(OperationError::new(
                    path.clone(),
                    format!("worker task failed: {join_error}"),
                ));
                progress.set_current_file(Some(path));
                failed += 1;
            }
        }
        let _ = tx.send(OperationResult::Progress(progress.clone())).await;
    }

    let mut errors = progress.errors;
    errors.sort_by(|a, b| a.path.cmp(&b.path));

    let _ = tx
        .send(OperationResult::Complete(OperationComplete {
            operation_type,
            succeeded,
            failed,
            bytes_processed: progress.bytes_processed,
            errors,
        }))
        .await;
}

async fn run_one<F>(
    path: RelativePath,
    apply: Arc<F>,
    semaphore: Arc<Semaphore>,
) -> (RelativePath, Result<u64, OperationError>)
where
    F: Fn(&RelativePath) -> Result<u64, OperationError> + Send + Sync + 'static,
{
    let _permit = match semaphore.acquire_owned().await {
        Ok(permit) => permit,
        Err(e) => {
            let error = OperationError::new(path.clone(), format!("worker pool closed: {e}"));
            return (path, Err(error));
        }
    };

    let task_path = path.clone();
    let result = match tokio::task::spawn_blocking(move || apply(&task_path)).await {
        Ok(result) => result,
        Err(e) => Err(OperationError::new(
            path.clone(),
            format!("worker task failed: {e}"),
        )),
    };
    (path, result)
}

/// Drain an operation channel, passing each progress update to
/// `on_progress`, and return the completion record.
///
/// Returns `None` if the channel closed without a completion.
pub async fn drain_results(
    mut rx: mpsc::Receiver<OperationResult>,
    mut on_progress: impl FnMut(&OperationProgress),
) -> Option<OperationComplete> {
    while let Some(result) = rx.recv().await {
        match result {
            OperationResult::Progress(progress) => on_progress(&progress),
            OperationResult::Complete(complete) => return Some(complete),
        }
    }
    None
}
