//! Shared test utilities for the s3prune library crate.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use aws_sdk_s3::operation::delete_objects::DeleteObjectsOutput;
use aws_sdk_s3::primitives::DateTime;
use aws_sdk_s3::types::{DeletedObject, Object, ObjectIdentifier};

use crate::config::Config;
use crate::storage::StorageTrait;
use crate::types::token::PipelineCancellationToken;
use crate::types::{ObjectPage, S3Object};

/// Initialise a dummy tracing subscriber for tests.
///
/// Uses `try_init` so that only the first call in a process actually
/// installs the subscriber; subsequent calls are silently ignored.
pub(crate) fn init_dummy_tracing_subscriber() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("dummy=trace")
        .try_init();
}

/// Config for `test-bucket` with a cutoff of 2024-01-01 and 4 workers.
pub(crate) fn make_test_config() -> Config {
    let mut config = Config::for_target("test-bucket", "2024-01-01T00:00:00Z");
    config.worker_size = 4;
    config
}

/// Create an [`S3Object`] last modified `secs` after the epoch.
pub(crate) fn make_s3_object(key: &str, secs: i64) -> S3Object {
    S3Object::new(
        Object::builder()
            .key(key)
            .size(1024)
            .last_modified(DateTime::from_secs(secs))
            .build(),
    )
}

/// In-memory bucket used by unit tests.
///
/// Pages are cut from `objects` in listing order, `max_keys` at a time, and
/// the continuation token is the offset of the next page. Every call is
/// recorded so tests can assert on the traffic the pipeline produced.
#[derive(Clone, Default)]
pub(crate) struct StubStorage {
    objects: Arc<Vec<S3Object>>,
    fail_list_page: Option<usize>,
    fail_batches_containing: Arc<HashSet<String>>,
    failing_keys: Arc<HashSet<String>>,
    delete_delay: Option<Duration>,
    cancel_after_page: Option<(usize, PipelineCancellationToken)>,
    list_calls: Arc<AtomicUsize>,
    delete_calls: Arc<Mutex<Vec<Vec<String>>>>,
}

impl StubStorage {
    pub(crate) fn with_objects(objects: Vec<S3Object>) -> Self {
        Self {
            objects: Arc::new(objects),
            ..Self::default()
        }
    }

    /// Fail the listing call for the zero-based page `page`.
    pub(crate) fn fail_list_on_page(mut self, page: usize) -> Self {
        self.fail_list_page = Some(page);
        self
    }

    /// Fail the whole DeleteObjects call for any batch holding `key`.
    pub(crate) fn fail_batch_containing(mut self, key: &str) -> Self {
        let mut keys = (*self.fail_batches_containing).clone();
        keys.insert(key.to_string());
        self.fail_batches_containing = Arc::new(keys);
        self
    }

    /// Report a per-key error for `key` while the call itself succeeds.
    pub(crate) fn fail_key(mut self, key: &str) -> Self {
        let mut keys = (*self.failing_keys).clone();
        keys.insert(key.to_string());
        self.failing_keys = Arc::new(keys);
        self
    }

    pub(crate) fn with_delete_delay(mut self, delay: Duration) -> Self {
        self.delete_delay = Some(delay);
        self
    }

    /// Cancel `token` once the zero-based page `page` has been returned.
    pub(crate) fn cancel_after_page(mut self, page: usize, token: PipelineCancellationToken) -> Self {
        self.cancel_after_page = Some((page, token));
        self
    }

    pub(crate) fn list_call_count(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Keys of every DeleteObjects call, in the order the calls were made.
    pub(crate) fn delete_calls(&self) -> Vec<Vec<String>> {
        self.delete_calls.lock().unwrap().clone()
    }

    pub(crate) fn requested_keys(&self) -> Vec<String> {
        self.delete_calls().into_iter().flatten().collect()
    }
}

#[async_trait]
impl StorageTrait for StubStorage {
    async fn list_objects(
        &self,
        continuation_token: Option<String>,
        max_keys: i32,
    ) -> Result<ObjectPage> {
        let page_index = self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list_page == Some(page_index) {
            return Err(anyhow!("AccessDenied: listing page {page_index} refused"));
        }

        let start = continuation_token
            .map(|token| token.parse::<usize>())
            .transpose()?
            .unwrap_or(0);
        let end = (start + max_keys as usize).min(self.objects.len());

        let page = ObjectPage {
            objects: self.objects[start..end].to_vec(),
            next_continuation_token: (end < self.objects.len()).then(|| end.to_string()),
        };

        if let Some((cancel_page, token)) = &self.cancel_after_page {
            if *cancel_page == page_index {
                token.cancel();
            }
        }

        Ok(page)
    }

    async fn delete_objects(&self, objects: Vec<ObjectIdentifier>) -> Result<DeleteObjectsOutput> {
        let keys: Vec<String> = objects.iter().map(|object| object.key().to_string()).collect();
        self.delete_calls.lock().unwrap().push(keys.clone());

        if let Some(delay) = self.delete_delay {
            tokio::time::sleep(delay).await;
        }

        if keys
            .iter()
            .any(|key| self.fail_batches_containing.contains(key))
        {
            return Err(anyhow!("SlowDown: please reduce your request rate"));
        }

        let mut builder = DeleteObjectsOutput::builder();
        for key in &keys {
            if self.failing_keys.contains(key) {
                builder = builder.errors(
                    aws_sdk_s3::types::Error::builder()
                        .key(key)
                        .code("AccessDenied")
                        .message("Access Denied")
                        .build(),
                );
            } else {
                builder = builder.deleted(DeletedObject::builder().key(key).build());
            }
        }

        Ok(builder.build())
    }
}
