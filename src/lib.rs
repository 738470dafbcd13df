/*!
# Overview
s3prune-rs bulk-deletes the objects of an Amazon S3 (or S3-compatible) bucket
whose last-modified time is earlier than a given date.

## Features
- **Streaming scan**: the bucket is listed page by page; candidate keys are
  grouped into batches of up to 1000 keys while listing continues
- **Parallel deletion**: a fixed pool of workers issues quiet-mode
  DeleteObjects requests, with backpressure from a bounded channel
- **Failure isolation**: a failed batch is reported and counted, never retried,
  and never stops sibling workers
- **Library-First**: the s3prune CLI is a thin wrapper over this crate

## As a Library

```toml
[dependencies]
s3prune-rs = "0.1"
tokio = { version = "1", features = ["full"] }
```

```no_run
use s3prune_rs::{Config, DeletionPipeline, create_pipeline_cancellation_token};

#[tokio::main]
async fn main() {
    let config = Config::for_target("my-bucket", "2024-01-01");
    let cancellation_token = create_pipeline_cancellation_token();
    let mut pipeline = DeletionPipeline::new(config, cancellation_token);
    pipeline.close_stats_sender();
    pipeline.run().await;

    if pipeline.has_error() {
        eprintln!("{:?}", pipeline.get_errors_and_consume().unwrap()[0]);
    }

    let stats = pipeline.get_deletion_stats();
    println!(
        "Deleted {}/{} objects",
        stats.stats_deleted_objects, stats.stats_candidate_objects
    );
}
```
*/

#![allow(clippy::collapsible_if)]

pub mod config;
pub mod deleter;
pub mod filters;
pub mod pipeline;
pub mod scanner;
pub mod stage;
pub mod storage;
pub mod types;

#[cfg(test)]
mod property_tests;
#[cfg(test)]
pub(crate) mod test_utils;

pub use config::Config;
pub use config::args::{CLIArgs, build_config_from_args, parse_from_args};
pub use config::target_date::parse_target_date;
pub use pipeline::DeletionPipeline;
pub use storage::{Storage, StorageTrait};
pub use types::error::{S3PruneError, exit_code_from_error};
pub use types::token::{PipelineCancellationToken, create_pipeline_cancellation_token};
pub use types::{DeletionBatch, DeletionStatistics, DeletionStats, ObjectPage, S3Object};
