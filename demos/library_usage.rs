//! Run a deletion from Rust code instead of the s3prune binary.
//!
//! Usage:
//!   cargo run --example library_usage -- my-bucket 2024-01-01

use s3prune_rs::{
    Config, DeletionPipeline, DeletionStatistics, create_pipeline_cancellation_token,
};

#[tokio::main]
async fn main() {
    let mut args = std::env::args().skip(1);
    let (Some(bucket), Some(date)) = (args.next(), args.next()) else {
        eprintln!("usage: library_usage <bucket> <date>");
        std::process::exit(2);
    };

    let mut config = Config::for_target(&bucket, &date);
    config.worker_size = 16;

    let cancellation_token = create_pipeline_cancellation_token();
    let mut pipeline = DeletionPipeline::new(config, cancellation_token.clone());

    let stats_receiver = pipeline.get_stats_receiver();
    let progress = tokio::spawn(async move {
        while let Ok(stats) = stats_receiver.recv().await {
            match stats {
                DeletionStatistics::DeleteComplete { count } => println!("Deleted {count} objects"),
                DeletionStatistics::DeleteWarning { key } => eprintln!("could not delete {key}"),
                _ => {}
            }
        }
    });

    let ctrl_c_token = cancellation_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_token.cancel();
        }
    });

    pipeline.run().await;
    let _ = progress.await;

    let stats = pipeline.get_deletion_stats();
    println!(
        "Deleted {}/{} objects in {:?}",
        stats.stats_deleted_objects, stats.stats_candidate_objects, stats.duration
    );

    if let Some(errors) = pipeline.get_errors_and_consume() {
        for error in &errors {
            eprintln!("{error:#}");
        }
        std::process::exit(s3prune_rs::exit_code_from_error(&errors[0]));
    }
}
