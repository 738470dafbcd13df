use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result, anyhow};
use async_channel::{Receiver, Sender};

use crate::config::Config;
use crate::storage::Storage;
use crate::types::token::PipelineCancellationToken;
use crate::types::{DeletionBatch, DeletionStatistics};

/// Result of handing a batch to the deletion workers.
#[derive(Debug, Clone, PartialEq)]
pub enum SendResult {
    Success,
    Closed,
}

/// Shared context passed to each pipeline stage.
///
/// The scanner owns a `Stage` with only a `sender`; every deletion worker
/// owns one with only a `receiver`. Both ends carry [`DeletionBatch`] values.
pub struct Stage {
    pub config: Config,
    pub target: Storage,
    pub receiver: Option<Receiver<DeletionBatch>>,
    pub sender: Option<Sender<DeletionBatch>>,
    pub cancellation_token: PipelineCancellationToken,
    pub stats_sender: Sender<DeletionStatistics>,
    pub has_warning: Arc<AtomicBool>,
}

impl Stage {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Config,
        target: Storage,
        receiver: Option<Receiver<DeletionBatch>>,
        sender: Option<Sender<DeletionBatch>>,
        cancellation_token: PipelineCancellationToken,
        stats_sender: Sender<DeletionStatistics>,
        has_warning: Arc<AtomicBool>,
    ) -> Self {
        Self {
            config,
            target,
            receiver,
            sender,
            cancellation_token,
            stats_sender,
            has_warning,
        }
    }

    /// Hand a batch to the next idle worker, waiting while every worker is busy.
    ///
    /// Returns `SendResult::Closed` if the channel has already been closed.
    pub async fn send(&self, batch: DeletionBatch) -> Result<SendResult> {
        let sender = self.sender()?;
        let result = sender
            .send(batch)
            .await
            .context("async_channel::Sender::send() failed.");

        if let Err(e) = result {
            return if !sender.is_closed() {
                Err(anyhow!(e))
            } else {
                Ok(SendResult::Closed)
            };
        }

        Ok(SendResult::Success)
    }

    /// Close the dispatch channel. Workers drain what is queued, then exit.
    pub fn close_sender(&self) {
        if let Some(sender) = self.sender.as_ref() {
            sender.close();
        }
    }

    pub fn is_channel_closed(&self) -> bool {
        self.sender
            .as_ref()
            .is_none_or(|sender| sender.is_closed())
    }

    /// Send a statistics event; a dropped receiver is ignored.
    pub async fn send_stats(&self, stats: DeletionStatistics) {
        let _ = self.stats_sender.send(stats).await;
    }

    pub fn set_warning(&self) {
        self.has_warning.store(true, Ordering::SeqCst);
    }

    fn sender(&self) -> Result<&Sender<DeletionBatch>> {
        self.sender
            .as_ref()
            .ok_or_else(|| anyhow!("stage has no dispatch sender."))
    }
}
