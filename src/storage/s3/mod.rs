pub mod client_builder;

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::delete_objects::DeleteObjectsOutput;
use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Output;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use aws_smithy_types::error::metadata::ProvideErrorMetadata;
use std::sync::Arc;

use crate::config::ClientConfig;
use crate::storage::{Storage, StorageTrait};
use crate::types::{ObjectPage, S3Object};

/// Extracts the S3 error code and message from an AWS SDK error.
///
/// Service errors yield the S3 error code (e.g. "AccessDenied") and the
/// message from the response. Any other error (network, timeout,
/// construction failure) yields "N/A" and the full error description.
fn extract_sdk_error_details<E: std::fmt::Display + ProvideErrorMetadata>(
    e: &SdkError<E>,
) -> (String, String) {
    if let Some(service_err) = e.as_service_error() {
        (
            service_err.code().unwrap_or("unknown").to_string(),
            service_err.message().unwrap_or("no message").to_string(),
        )
    } else {
        ("N/A".to_string(), e.to_string())
    }
}

pub struct S3StorageFactory;

impl S3StorageFactory {
    pub async fn create(bucket: &str, client_config: &ClientConfig) -> Storage {
        let client = Arc::new(client_config.create_client().await);

        Box::new(S3Storage {
            bucket: bucket.to_string(),
            client,
        })
    }
}

/// [`StorageTrait`] backed by the AWS SDK S3 client.
#[derive(Clone)]
struct S3Storage {
    bucket: String,
    client: Arc<Client>,
}

#[async_trait]
impl StorageTrait for S3Storage {
    async fn list_objects(
        &self,
        continuation_token: Option<String>,
        max_keys: i32,
    ) -> Result<ObjectPage> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .set_continuation_token(continuation_token)
            .max_keys(max_keys)
            .send()
            .await
            .map_err(|e| {
                let (s3_error_code, s3_error_message) = extract_sdk_error_details(&e);
                tracing::error!(
                    bucket = self.bucket,
                    s3_error_code = s3_error_code,
                    s3_error_message = s3_error_message,
                    "S3 ListObjectsV2 API call failed for s3://{}: {} ({}).",
                    self.bucket,
                    s3_error_code,
                    s3_error_message,
                );
                anyhow::anyhow!(e).context("aws_sdk_s3::client::list_objects_v2() failed.")
            })?;

        Ok(page_from_output(output))
    }

    async fn delete_objects(&self, objects: Vec<ObjectIdentifier>) -> Result<DeleteObjectsOutput> {
        let object_count = objects.len();

        let delete = Delete::builder()
            .set_objects(Some(objects))
            .quiet(true)
            .build()
            .context("Failed to build Delete request")?;

        self.client
            .delete_objects()
            .bucket(&self.bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| {
                let (s3_error_code, s3_error_message) = extract_sdk_error_details(&e);
                tracing::error!(
                    bucket = self.bucket,
                    object_count = object_count,
                    s3_error_code = s3_error_code,
                    s3_error_message = s3_error_message,
                    "S3 DeleteObjects API call failed for {} objects in s3://{}: {} ({}).",
                    object_count,
                    self.bucket,
                    s3_error_code,
                    s3_error_message,
                );
                anyhow::anyhow!(e).context("aws_sdk_s3::client::delete_objects() failed.")
            })
    }
}

/// The continuation token is only carried over while the listing is truncated.
fn page_from_output(output: ListObjectsV2Output) -> ObjectPage {
    let next_continuation_token = if output.is_truncated() == Some(true) {
        output.next_continuation_token().map(String::from)
    } else {
        None
    };

    ObjectPage {
        objects: output
            .contents
            .unwrap_or_default()
            .into_iter()
            .map(S3Object::new)
            .collect(),
        next_continuation_token,
    }
}
