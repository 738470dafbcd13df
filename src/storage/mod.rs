use anyhow::{Result, anyhow};
use async_trait::async_trait;
use aws_sdk_s3::operation::delete_objects::DeleteObjectsOutput;
use aws_sdk_s3::types::ObjectIdentifier;
use dyn_clone::DynClone;

use crate::config::Config;
use crate::types::error::S3PruneError;
use crate::types::{ObjectPage, S3Credentials};

pub mod s3;

/// Type alias for a boxed Storage trait object.
pub type Storage = Box<dyn StorageTrait + Send + Sync>;

/// Bucket operations the deletion pipeline needs.
///
/// Implementations are cloned into the scanner and into every deletion
/// worker, so they must be cheap to clone and safe to call concurrently.
#[async_trait]
pub trait StorageTrait: DynClone {
    /// Fetch one listing page of at most `max_keys` entries.
    ///
    /// Pass `None` for the first page, then the `next_continuation_token` of
    /// the previous page. Listing failures are unrecoverable.
    async fn list_objects(
        &self,
        continuation_token: Option<String>,
        max_keys: i32,
    ) -> Result<ObjectPage>;

    /// Delete up to 1000 keys in a single quiet-mode DeleteObjects request.
    ///
    /// An `Err` means the whole call failed. Per-key failures come back in
    /// the `errors` of the output.
    async fn delete_objects(&self, objects: Vec<ObjectIdentifier>) -> Result<DeleteObjectsOutput>;
}

dyn_clone::clone_trait_object!(StorageTrait);

/// Create the S3 storage for the configured bucket.
///
/// Fails with [`S3PruneError::ClientConstruction`] when no client settings
/// are present, or when a custom endpoint is given without static
/// credentials.
pub async fn create_storage(config: &Config) -> Result<Storage> {
    let client_config = config.target_client_config.as_ref().ok_or_else(|| {
        anyhow!(S3PruneError::ClientConstruction(
            "no client configuration".to_string()
        ))
    })?;

    if client_config.endpoint_url.is_some()
        && matches!(client_config.credential, S3Credentials::FromEnvironment)
    {
        return Err(anyhow!(S3PruneError::ClientConstruction(
            "access key and secret key are required with a custom endpoint".to_string()
        )));
    }

    Ok(s3::S3StorageFactory::create(&config.bucket, client_config).await)
}
