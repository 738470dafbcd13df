//! Deletion pipeline orchestrator.
//!
//! The scanner runs on the calling task and feeds a bounded MPMC channel
//! whose capacity equals the worker count. `worker_size` ObjectDeleter
//! workers share the receiving end.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};
use async_channel::{Receiver, Sender};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::config::target_date::parse_target_date;
use crate::deleter::ObjectDeleter;
use crate::filters::MtimeBeforeFilter;
use crate::scanner::ObjectScanner;
use crate::stage::Stage;
use crate::storage::{self, Storage};
use crate::types::error::S3PruneError;
use crate::types::token::PipelineCancellationToken;
use crate::types::{DeletionBatch, DeletionStatistics, DeletionStats, DeletionStatsReport};

/// The core deletion pipeline orchestrator.
///
/// ```text
/// ObjectScanner → dispatch channel (capacity = workers) → ObjectDeleter × workers
/// ```
///
/// ## Usage
///
/// ```no_run
/// # async fn example() {
/// use s3prune_rs::{Config, DeletionPipeline, create_pipeline_cancellation_token};
///
/// let config = Config::for_target("my-bucket", "2024-01-01");
/// let cancellation_token = create_pipeline_cancellation_token();
/// let mut pipeline = DeletionPipeline::new(config, cancellation_token);
/// pipeline.close_stats_sender();
/// pipeline.run().await;
/// if pipeline.has_error() {
///     eprintln!("{:?}", pipeline.get_errors_and_consume().unwrap()[0]);
/// }
/// # }
/// ```
pub struct DeletionPipeline {
    config: Config,
    target: Option<Storage>,
    cancellation_token: PipelineCancellationToken,
    stats_sender: Sender<DeletionStatistics>,
    stats_receiver: Receiver<DeletionStatistics>,
    has_error: Arc<AtomicBool>,
    has_panic: Arc<AtomicBool>,
    has_warning: Arc<AtomicBool>,
    errors: Arc<Mutex<VecDeque<anyhow::Error>>>,
    ready: bool,
    deletion_stats_report: Arc<DeletionStatsReport>,
    elapsed: Option<Duration>,
}

impl DeletionPipeline {
    /// Create a pipeline that builds its S3 client from `config` when run.
    pub fn new(config: Config, cancellation_token: PipelineCancellationToken) -> Self {
        Self::build(config, cancellation_token, None)
    }

    /// Create a pipeline that works on an already constructed storage.
    ///
    /// Client construction is skipped; every other step runs as usual.
    pub fn with_storage(
        config: Config,
        cancellation_token: PipelineCancellationToken,
        target: Storage,
    ) -> Self {
        Self::build(config, cancellation_token, Some(target))
    }

    fn build(
        config: Config,
        cancellation_token: PipelineCancellationToken,
        target: Option<Storage>,
    ) -> Self {
        let (stats_sender, stats_receiver) = async_channel::unbounded();

        Self {
            config,
            target,
            cancellation_token,
            stats_sender,
            stats_receiver,
            has_error: Arc::new(AtomicBool::new(false)),
            has_panic: Arc::new(AtomicBool::new(false)),
            has_warning: Arc::new(AtomicBool::new(false)),
            errors: Arc::new(Mutex::new(VecDeque::new())),
            ready: true,
            deletion_stats_report: Arc::new(DeletionStatsReport::new()),
            elapsed: None,
        }
    }

    /// Run the deletion pipeline.
    ///
    /// 1. Validate the configuration
    /// 2. Create the S3 client (unless a storage was injected)
    /// 3. Parse the target date
    /// 4. Spawn the deletion workers
    /// 5. Scan the bucket on this task, then close the channel
    /// 6. Wait for every worker to drain the channel
    ///
    /// Failures are recorded and can be read with [`Self::has_error`] and
    /// [`Self::get_errors_and_consume`].
    pub async fn run(&mut self) {
        assert!(self.ready, "DeletionPipeline::run() called more than once");
        self.ready = false;

        if let Err(e) = self.execute_pipeline().await {
            error!(error = format!("{e:#}"), "deletion pipeline has failed.");
            self.record_error(e);
        }

        self.shutdown();
    }

    /// Check if any error occurred during the pipeline execution.
    pub fn has_error(&self) -> bool {
        self.has_error.load(Ordering::SeqCst)
    }

    /// Check if any spawned task panicked during the pipeline execution.
    pub fn has_panic(&self) -> bool {
        self.has_panic.load(Ordering::SeqCst)
    }

    /// Check if any object could not be deleted.
    pub fn has_warning(&self) -> bool {
        self.has_warning.load(Ordering::SeqCst)
    }

    /// Consume and return all accumulated errors.
    ///
    /// Returns `None` if no errors occurred.
    pub fn get_errors_and_consume(&self) -> Option<Vec<anyhow::Error>> {
        if !self.has_error() {
            return None;
        }
        let mut error_list = self.errors.lock().unwrap();
        let mut errors = Vec::with_capacity(error_list.len());
        while let Some(e) = error_list.pop_front() {
            errors.push(e);
        }
        Some(errors)
    }

    /// Get error messages without consuming them.
    ///
    /// Returns `None` if no errors occurred.
    pub fn get_error_messages(&self) -> Option<Vec<String>> {
        if !self.has_error() {
            return None;
        }
        let error_list = self.errors.lock().unwrap();
        Some(error_list.iter().map(|e| e.to_string()).collect())
    }

    /// Get the stats receiver for progress reporting.
    pub fn get_stats_receiver(&self) -> Receiver<DeletionStatistics> {
        self.stats_receiver.clone()
    }

    /// Snapshot of the counters, with the scan-to-join duration once known.
    pub fn get_deletion_stats(&self) -> DeletionStats {
        self.deletion_stats_report
            .snapshot(self.elapsed.unwrap_or_default())
    }

    /// Time from the start of the scan until every worker finished.
    ///
    /// `None` when the run stopped before the scan started.
    pub fn elapsed(&self) -> Option<Duration> {
        self.elapsed
    }

    /// Close the stats sender to signal the progress reporter to finish.
    ///
    /// Call this before `run()` if you don't need progress reporting.
    pub fn close_stats_sender(&self) {
        self.stats_sender.close();
    }

    async fn execute_pipeline(&mut self) -> Result<()> {
        self.config.validate()?;

        let target = match self.target.take() {
            Some(target) => target,
            None => storage::create_storage(&self.config).await?,
        };

        let cutoff = parse_target_date(&self.config.target_date)?;

        info!(
            bucket = self.config.bucket,
            cutoff = cutoff.to_rfc3339(),
            workers = self.config.worker_size,
            max_keys = self.config.max_keys,
            "deletion pipeline has started."
        );

        let started_at = Instant::now();

        let (sender, receiver) =
            async_channel::bounded::<DeletionBatch>(usize::from(self.config.worker_size));
        let worker_handles = self.delete_objects(&target, receiver);

        let scanner = ObjectScanner::new(
            self.create_stage(target, None, Some(sender)),
            MtimeBeforeFilter::new(cutoff),
            self.deletion_stats_report.clone(),
        );
        let scan_result = scanner.scan().await;

        for worker_handle in worker_handles {
            if let Err(e) = worker_handle.await {
                self.has_panic.store(true, Ordering::SeqCst);
                self.record_error(anyhow!("delete worker supervisor panicked: {}", e));
            }
        }

        self.elapsed = Some(started_at.elapsed());

        let stats = self.get_deletion_stats();
        info!(
            listed = stats.stats_listed_objects,
            candidates = stats.stats_candidate_objects,
            deleted = stats.stats_deleted_objects,
            failed = stats.stats_failed_objects,
            batches = stats.stats_dispatched_batches,
            duration_millis = stats.duration.as_millis() as u64,
            "deletion pipeline has been completed."
        );

        scan_result?;

        if self.config.warn_as_error && self.has_warning() {
            return Err(anyhow!(S3PruneError::Pipeline(format!(
                "{} objects could not be deleted (--warn-as-error)",
                stats.stats_failed_objects
            ))));
        }

        Ok(())
    }

    fn record_error(&self, error: anyhow::Error) {
        self.has_error.store(true, Ordering::SeqCst);
        self.errors.lock().unwrap().push_back(error);
    }

    fn shutdown(&self) {
        self.close_stats_sender();
    }

    fn create_stage(
        &self,
        target: Storage,
        receiver: Option<Receiver<DeletionBatch>>,
        sender: Option<Sender<DeletionBatch>>,
    ) -> Stage {
        Stage::new(
            self.config.clone(),
            target,
            receiver,
            sender,
            self.cancellation_token.clone(),
            self.stats_sender.clone(),
            self.has_warning.clone(),
        )
    }

    /// Spawn `worker_size` ObjectDeleter workers sharing one receiver.
    ///
    /// A worker that fails or panics cancels the run so the scanner never
    /// blocks on a channel nobody drains.
    fn delete_objects(
        &self,
        target: &Storage,
        receiver: Receiver<DeletionBatch>,
    ) -> Vec<JoinHandle<()>> {
        (0..self.config.worker_size)
            .map(|worker_index| {
                let object_deleter = ObjectDeleter::new(
                    self.create_stage(target.clone(), Some(receiver.clone()), None),
                    worker_index,
                    self.deletion_stats_report.clone(),
                );

                let has_error = self.has_error.clone();
                let has_panic = self.has_panic.clone();
                let error_list = self.errors.clone();
                let cancellation_token = self.cancellation_token.clone();

                tokio::spawn(async move {
                    let join_result =
                        tokio::spawn(async move { object_deleter.delete().await }).await;

                    match join_result {
                        Ok(Ok(())) => {
                            debug!(worker_index, "delete worker completed successfully.");
                        }
                        Ok(Err(e)) => {
                            cancellation_token.cancel();
                            has_error.store(true, Ordering::SeqCst);
                            error!(worker_index, "delete worker failed: {}", e);
                            error_list.lock().unwrap().push_back(e);
                        }
                        Err(e) => {
                            cancellation_token.cancel();
                            has_error.store(true, Ordering::SeqCst);
                            has_panic.store(true, Ordering::SeqCst);
                            error!(worker_index, "delete worker task panicked: {}", e);
                            error_list.lock().unwrap().push_back(anyhow!(
                                S3PruneError::Pipeline(format!("delete worker panicked: {e}"))
                            ));
                        }
                    }
                })
            })
            .collect()
    }
}
