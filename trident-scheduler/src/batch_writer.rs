//! Batched result writer: accumulates non-valid result rows handed off
//! by the consumer and commits them to the datastore in bulk.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use trident_data::Datastore;
use trident_types::ResultRow;

/// Channel capacity, and the row-count ceiling that forces an early
/// commit.
pub const BATCH_MAX_ROWS: usize = 5000;
/// A batch commits this long after its first row arrives, even if fewer
/// than `BATCH_MAX_ROWS` have accumulated.
pub const BATCH_MAX_WAIT: Duration = Duration::from_secs(3);

/// Spawns the batched writer task and returns the channel its caller
/// hands rows to, plus a handle to await its shutdown.
pub fn spawn(datastore: Arc<dyn Datastore>, cancel: CancellationToken) -> (mpsc::Sender<ResultRow>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(BATCH_MAX_ROWS);
    let requeue = tx.clone();
    let handle = tokio::spawn(run(rx, requeue, datastore, cancel));
    (tx, handle)
}

async fn run(mut rx: mpsc::Receiver<ResultRow>, requeue: mpsc::Sender<ResultRow>, datastore: Arc<dyn Datastore>, cancel: CancellationToken) {
    loop {
        let first = tokio::select! {
            _ = cancel.cancelled() => return,
            row = rx.recv() => match row {
                Some(row) => row,
                None => return,
            },
        };

        let mut batch = Vec::with_capacity(BATCH_MAX_ROWS.min(64));
        batch.push(first);
        let deadline = tokio::time::Instant::now() + BATCH_MAX_WAIT;

        while batch.len() < BATCH_MAX_ROWS {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                break;
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                row = rx.recv() => match row {
                    Some(row) => batch.push(row),
                    None => break,
                },
                _ = tokio::time::sleep(remaining) => break,
            }
        }

        let count = batch.len();
        match datastore.insert_results_batch(&batch).await {
            Ok(failed) if failed.is_empty() => {
                tracing::debug!(count, "batch committed");
            }
            Ok(failed) => {
                tracing::warn!(count = failed.len(), total = count, "re-queueing rows that failed within a committed batch");
                for row in failed {
                    // Re-queue at the tail for the next batch; a full
                    // channel here means we're already badly backed up,
                    // so drop rather than block the writer loop.
                    if requeue.try_send(row).is_err() {
                        tracing::error!("batch requeue channel full, dropping row");
                    }
                }
            }
            Err(e) => {
                // Per the batched-writer's durability contract, a commit
                // failure is fatal: acks already happened at channel
                // handoff, so the only way to avoid silently losing
                // buffered rows is to stop taking new work and let the
                // supervisor restart the process. The bus redelivers
                // whatever wasn't acked before this happened.
                tracing::error!(error = %e, count, "batch commit failed, halting process");
                std::process::exit(1);
            }
        }
    }
}
