use std::sync::Arc;

use anyhow::{Result, anyhow};
use tracing::{debug, info, trace};

use crate::deleter::MAX_BATCH_SIZE;
use crate::filters::MtimeBeforeFilter;
use crate::stage::{SendResult, Stage};
use crate::types::error::S3PruneError;
use crate::types::{DeletionBatch, DeletionStatistics, DeletionStatsReport};

/// Lists the bucket page by page and groups candidate keys into batches.
///
/// The scanner is the only producer on the dispatch channel and closes it
/// on every exit path, so workers always observe the end of the stream.
///
/// ```text
/// ObjectScanner → dispatch channel → ObjectDeleter × workers
/// ```
pub struct ObjectScanner {
    stage: Stage,
    filter: MtimeBeforeFilter,
    stats_report: Arc<DeletionStatsReport>,
}

impl ObjectScanner {
    pub fn new(
        stage: Stage,
        filter: MtimeBeforeFilter,
        stats_report: Arc<DeletionStatsReport>,
    ) -> Self {
        Self {
            stage,
            filter,
            stats_report,
        }
    }

    /// Scan the whole bucket and return the number of dispatched batches.
    ///
    /// A listing failure stops the scan with [`S3PruneError::Listing`]; keys
    /// buffered but not yet dispatched are dropped. Cancellation stops the
    /// scan before the next page without flushing the partial batch.
    pub async fn scan(&self) -> Result<u64> {
        debug!("scan target objects has started.");

        let result = self.scan_pages().await;
        self.stage.close_sender();

        match &result {
            Ok(dispatched_batches) => debug!(
                dispatched_batches = dispatched_batches,
                "scan target objects has been completed."
            ),
            Err(e) => debug!(error = format!("{e:#}"), "scan target objects has failed."),
        }

        result
    }

    async fn scan_pages(&self) -> Result<u64> {
        let max_keys = self.stage.config.max_keys;
        let batch_size = usize::from(max_keys).clamp(1, MAX_BATCH_SIZE);

        let mut batch = DeletionBatch::with_capacity(batch_size);
        let mut continuation_token: Option<String> = None;
        let mut dispatched_batches = 0;

        loop {
            if self.stage.cancellation_token.is_cancelled() {
                info!("scan has been cancelled.");
                return Ok(dispatched_batches);
            }

            let page = self
                .stage
                .target
                .list_objects(continuation_token.take(), i32::from(max_keys))
                .await
                .map_err(|e| anyhow!(S3PruneError::Listing(format!("{e:#}"))))?;

            let listed = page.objects.len() as u64;
            let mut matched = 0;
            self.stats_report.add_listed(listed);

            for object in &page.objects {
                if !self.filter.is_match(object) {
                    continue;
                }
                let Some(key) = object.key() else {
                    continue;
                };

                matched += 1;
                self.stats_report.increment_candidates();
                batch.push(key);

                if batch_size <= batch.len() {
                    let full_batch = std::mem::replace(
                        &mut batch,
                        DeletionBatch::with_capacity(batch_size),
                    );
                    if !self.dispatch(full_batch).await? {
                        return Ok(dispatched_batches);
                    }
                    dispatched_batches += 1;
                }
            }

            trace!(listed = listed, matched = matched, "listing page scanned.");
            self.stage
                .send_stats(DeletionStatistics::ObjectsListed { listed, matched })
                .await;

            match page.next_continuation_token {
                Some(token) => continuation_token = Some(token),
                None => break,
            }
        }

        if !batch.is_empty() && self.dispatch(batch).await? {
            dispatched_batches += 1;
        }

        Ok(dispatched_batches)
    }

    /// Returns `false` when the batch was not handed over because the run
    /// was cancelled or the channel is closed.
    async fn dispatch(&self, batch: DeletionBatch) -> Result<bool> {
        let key_count = batch.len();

        let send_result = tokio::select! {
            biased;
            _ = self.stage.cancellation_token.cancelled() => {
                info!(key_count = key_count, "batch has not been dispatched due to cancellation.");
                return Ok(false);
            }
            send_result = self.stage.send(batch) => send_result?,
        };

        match send_result {
            SendResult::Success => {
                self.stats_report.increment_dispatched_batches();
                debug!(key_count = key_count, "batch has been dispatched.");
                Ok(true)
            }
            SendResult::Closed => Ok(false),
        }
    }
}
