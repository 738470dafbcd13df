//! Batch deletion using the S3 DeleteObjects API.

use anyhow::{Context, Result, anyhow};
use aws_sdk_s3::types::ObjectIdentifier;
use tracing::debug;

use crate::storage::Storage;
use crate::types::DeletionBatch;
use crate::types::error::S3PruneError;

/// Maximum objects per batch DeleteObjects API call (S3 limit).
pub const MAX_BATCH_SIZE: usize = 1000;

/// Outcome of one DeleteObjects call that reached the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteResult {
    /// Keys requested minus keys reported as failed.
    pub deleted: u64,
    pub failed: Vec<FailedKey>,
}

/// A key the store refused to delete.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedKey {
    pub key: String,
    pub error_code: String,
    pub error_message: String,
}

/// Issues one quiet-mode DeleteObjects call per batch.
#[derive(Clone)]
pub struct BatchDeleter {
    target: Storage,
}

impl BatchDeleter {
    pub fn new(target: Storage) -> Self {
        Self { target }
    }

    /// Delete every key of `batch` in a single request.
    ///
    /// An `Err` means the request as a whole failed and no key can be
    /// assumed deleted. Quiet mode only reports failures, so every key not
    /// listed in the response errors counts as deleted.
    pub async fn delete(&self, batch: &DeletionBatch) -> Result<DeleteResult> {
        if batch.is_empty() {
            return Ok(DeleteResult::default());
        }
        if MAX_BATCH_SIZE < batch.len() {
            return Err(anyhow!(S3PruneError::DeleteBatch(format!(
                "batch of {} keys exceeds the limit of {MAX_BATCH_SIZE}",
                batch.len()
            ))));
        }

        let identifiers = batch
            .keys()
            .iter()
            .map(|key| {
                ObjectIdentifier::builder()
                    .key(key)
                    .build()
                    .context("ObjectIdentifier::builder().build() failed.")
            })
            .collect::<Result<Vec<_>>>()?;

        let requested = identifiers.len() as u64;
        debug!(
            batch_size = requested,
            "sending DeleteObjects batch request."
        );

        let response = self
            .target
            .delete_objects(identifiers)
            .await
            .map_err(|e| anyhow!(S3PruneError::DeleteBatch(format!("{e:#}"))))?;

        let failed: Vec<FailedKey> = response
            .errors()
            .iter()
            .map(|err| FailedKey {
                key: err.key().unwrap_or("unknown").to_string(),
                error_code: err.code().unwrap_or("unknown").to_string(),
                error_message: err.message().unwrap_or("no message").to_string(),
            })
            .collect();

        Ok(DeleteResult {
            deleted: requested.saturating_sub(failed.len() as u64),
            failed,
        })
    }
}
