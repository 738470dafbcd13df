//! Deletion workers for the s3prune pipeline.
//!
//! Each [`ObjectDeleter`] takes whole batches off the shared dispatch channel
//! and submits them through [`BatchDeleter`]. A failed batch is counted and
//! reported as a warning; the worker then moves on to the next batch.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use tracing::{debug, info, warn};

use crate::stage::Stage;
use crate::types::{DeletionBatch, DeletionStatistics, DeletionStatsReport};

pub mod batch;

pub use batch::{BatchDeleter, DeleteResult, FailedKey, MAX_BATCH_SIZE};


/// Pipeline worker that deletes the batches it receives.
pub struct ObjectDeleter {
    worker_index: u16,
    base: Stage,
    deleter: BatchDeleter,
    deletion_stats_report: Arc<DeletionStatsReport>,
}

impl ObjectDeleter {
    pub fn new(
        base: Stage,
        worker_index: u16,
        deletion_stats_report: Arc<DeletionStatsReport>,
    ) -> Self {
        let deleter = BatchDeleter::new(base.target.clone());

        Self {
            worker_index,
            base,
            deleter,
            deletion_stats_report,
        }
    }

    /// Receive and delete batches until the channel is closed and drained.
    ///
    /// Once the run is cancelled no new batch is taken; a batch already
    /// being deleted is finished first.
    pub async fn delete(&self) -> Result<()> {
        debug!(worker_index = self.worker_index, "delete worker has started.");

        let receiver = self
            .base
            .receiver
            .as_ref()
            .ok_or_else(|| anyhow!("delete worker has no receiver."))?;

        loop {
            let batch = tokio::select! {
                biased;
                _ = self.base.cancellation_token.cancelled() => {
                    info!(worker_index = self.worker_index, "delete worker has been cancelled.");
                    return Ok(());
                }
                recv_result = receiver.recv() => match recv_result {
                    Ok(batch) => batch,
                    Err(_) => break,
                },
            };

            self.delete_batch(batch).await;
        }

        debug!(worker_index = self.worker_index, "delete worker has been completed.");
        Ok(())
    }

    async fn delete_batch(&self, batch: DeletionBatch) {
        let key_count = batch.len() as u64;

        let result = match self.deleter.delete(&batch).await {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    worker_index = self.worker_index,
                    key_count = key_count,
                    error = format!("{e:#}"),
                    "delete batch has failed."
                );

                self.deletion_stats_report.add_failed(key_count);
                self.base
                    .send_stats(DeletionStatistics::DeleteError { count: key_count })
                    .await;
                self.base.set_warning();
                return;
            }
        };

        self.deletion_stats_report.add_deleted(result.deleted);
        info!(
            worker_index = self.worker_index,
            deleted = result.deleted,
            failed = result.failed.len(),
            "deleted {} objects.",
            result.deleted
        );
        self.base
            .send_stats(DeletionStatistics::DeleteComplete {
                count: result.deleted,
            })
            .await;

        if result.failed.is_empty() {
            return;
        }

        for failed_key in &result.failed {
            warn!(
                worker_index = self.worker_index,
                key = failed_key.key,
                error_code = failed_key.error_code,
                error_message = failed_key.error_message,
                "delete object has failed."
            );
            self.base
                .send_stats(DeletionStatistics::DeleteWarning {
                    key: failed_key.key.clone(),
                })
                .await;
        }

        self.deletion_stats_report
            .add_failed(result.failed.len() as u64);
        self.base.set_warning();
    }
}
