//! Shared integration test infrastructure for s3prune-rs.
//!
//! Provides `MemoryBucket`, an in-memory `StorageTrait` implementation that
//! really removes deleted keys, and helpers to build configs and run the
//! pipeline through the public API only.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use aws_sdk_s3::operation::delete_objects::DeleteObjectsOutput;
use aws_sdk_s3::primitives::DateTime;
use aws_sdk_s3::types::{DeletedObject, Object, ObjectIdentifier};
use s3prune_rs::{
    Config, DeletionPipeline, DeletionStats, ObjectPage, PipelineCancellationToken, S3Object,
    StorageTrait, build_config_from_args, create_pipeline_cancellation_token,
    exit_code_from_error,
};

/// 2024-01-01T00:00:00Z
pub const CUTOFF_SECS: i64 = 1_704_067_200;
pub const CUTOFF: &str = "2024-01-01T00:00:00Z";

/// Result of running a deletion pipeline.
#[derive(Debug)]
pub struct PipelineResult {
    pub stats: DeletionStats,
    pub has_error: bool,
    pub has_warning: bool,
    pub scan_started: bool,
    /// Exit codes of the recorded errors, in order.
    pub exit_codes: Vec<i32>,
    pub errors: Vec<String>,
}

/// In-memory bucket listed in key order.
#[derive(Clone, Default)]
pub struct MemoryBucket {
    objects: Arc<Mutex<BTreeMap<String, i64>>>,
    failing_keys: Arc<Mutex<HashSet<String>>>,
    fail_list_on_call: Option<usize>,
    list_calls: Arc<AtomicUsize>,
    delete_calls: Arc<AtomicUsize>,
}

impl MemoryBucket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_object(&self, key: &str, last_modified_secs: i64) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), last_modified_secs);
    }

    /// The store refuses to delete `key` but accepts the rest of its batch.
    pub fn deny_delete(&self, key: &str) {
        self.failing_keys.lock().unwrap().insert(key.to_string());
    }

    /// The zero-based listing call `call` fails.
    pub fn fail_list_on_call(mut self, call: usize) -> Self {
        self.fail_list_on_call = Some(call);
        self
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn delete_call_count(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageTrait for MemoryBucket {
    async fn list_objects(
        &self,
        continuation_token: Option<String>,
        max_keys: i32,
    ) -> Result<ObjectPage> {
        let call = self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list_on_call == Some(call) {
            return Err(anyhow!("InternalError: listing call {call} failed"));
        }

        let objects = self.objects.lock().unwrap();
        let start_after = continuation_token.unwrap_or_default();
        let page: Vec<S3Object> = objects
            .iter()
            .filter(|(key, _)| start_after.is_empty() || start_after < **key)
            .take(max_keys as usize)
            .map(|(key, secs)| {
                S3Object::new(
                    Object::builder()
                        .key(key)
                        .size(128)
                        .last_modified(DateTime::from_secs(*secs))
                        .build(),
                )
            })
            .collect();

        let next_continuation_token = page.last().and_then(|last| {
            let last_key = last.key()?.to_string();
            objects
                .keys()
                .any(|key| last_key < *key)
                .then_some(last_key)
        });

        Ok(ObjectPage {
            objects: page,
            next_continuation_token,
        })
    }

    async fn delete_objects(&self, objects: Vec<ObjectIdentifier>) -> Result<DeleteObjectsOutput> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);

        let failing_keys = self.failing_keys.lock().unwrap().clone();
        let mut stored = self.objects.lock().unwrap();
        let mut builder = DeleteObjectsOutput::builder();
        for object in &objects {
            let key = object.key();
            if failing_keys.contains(key) {
                builder = builder.errors(
                    aws_sdk_s3::types::Error::builder()
                        .key(key)
                        .code("AccessDenied")
                        .message("Access Denied")
                        .build(),
                );
            } else {
                stored.remove(key);
                builder = builder.deleted(DeletedObject::builder().key(key).build());
            }
        }

        Ok(builder.build())
    }
}

/// Build a config from CLI-style arguments (the program name is added).
pub fn build_config(args: Vec<&str>) -> Config {
    let mut full_args = vec!["s3prune", "-qq", "--show-no-progress"];
    full_args.extend(args);
    build_config_from_args(full_args).unwrap()
}

pub async fn run_pipeline(config: Config, bucket: &MemoryBucket) -> PipelineResult {
    run_pipeline_with_token(config, bucket, create_pipeline_cancellation_token()).await
}

pub async fn run_pipeline_with_token(
    config: Config,
    bucket: &MemoryBucket,
    cancellation_token: PipelineCancellationToken,
) -> PipelineResult {
    let mut pipeline =
        DeletionPipeline::with_storage(config, cancellation_token, Box::new(bucket.clone()));
    pipeline.close_stats_sender();
    pipeline.run().await;

    let errors = pipeline.get_errors_and_consume().unwrap_or_default();

    PipelineResult {
        stats: pipeline.get_deletion_stats(),
        has_error: pipeline.has_error(),
        has_warning: pipeline.has_warning(),
        scan_started: pipeline.elapsed().is_some(),
        exit_codes: errors.iter().map(exit_code_from_error).collect(),
        errors: errors.iter().map(|e| format!("{e:#}")).collect(),
    }
}
