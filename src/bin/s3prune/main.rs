use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use tracing::{debug, error, trace};

use s3prune_rs::{
    CLIArgs, Config, DeletionPipeline, create_pipeline_cancellation_token,
    exit_code_from_error,
};

mod ctrl_c_handler;
pub mod indicator;
#[cfg(test)]
mod indicator_properties;
mod tracing_init;
pub mod ui_config;

/// s3prune - Delete every object in an S3 bucket last modified before a date.
///
/// This binary is a thin wrapper over the s3prune-rs library.
#[cfg_attr(coverage_nightly, coverage(off))]
#[tokio::main]
async fn main() {
    let config = load_config_exit_if_err();

    if let Some(shell) = config.auto_complete_shell {
        generate(
            shell,
            &mut CLIArgs::command(),
            "s3prune",
            &mut std::io::stdout(),
        );

        return;
    }

    start_tracing_if_necessary(&config);

    trace!("config = {:?}", config);

    if let Err(e) = run(config).await {
        eprintln!("s3prune: {e:#}");
        std::process::exit(exit_code_from_error(&e));
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
fn load_config_exit_if_err() -> Config {
    match Config::try_from(CLIArgs::parse()) {
        Ok(config) => config,
        Err(error_message) => {
            clap::Error::raw(clap::error::ErrorKind::ValueValidation, error_message).exit()
        }
    }
}

fn start_tracing_if_necessary(config: &Config) -> bool {
    let Some(tracing_config) = config.tracing_config.as_ref() else {
        return false;
    };

    tracing_init::init_tracing(tracing_config);
    true
}

async fn run(config: Config) -> Result<()> {
    let cancellation_token = create_pipeline_cancellation_token();
    ctrl_c_handler::spawn_ctrl_c_handler(cancellation_token.clone());

    debug!("deletion pipeline start.");

    let mut pipeline = DeletionPipeline::new(config.clone(), cancellation_token);
    let indicator_join_handle = indicator::show_indicator(
        pipeline.get_stats_receiver(),
        ui_config::is_progress_indicator_needed(&config),
        ui_config::is_batch_result_needed(&config),
    );

    pipeline.run().await;
    let indicator_summary = indicator_join_handle.await?;

    // Printed even after a listing failure, as long as the scan started.
    if let Some(elapsed) = pipeline.elapsed() {
        if ui_config::is_show_summary_needed(&config) {
            let stats = pipeline.get_deletion_stats();
            println!(
                "Operation complete. Deleted {}/{} objects in {:?}",
                stats.stats_deleted_objects, stats.stats_candidate_objects, elapsed
            );
        }
    }

    if pipeline.has_error() {
        let mut errors = pipeline.get_errors_and_consume().unwrap_or_default();
        for err in errors.iter().skip(1) {
            error!("{:#}", err);
        }
        if !errors.is_empty() {
            let first_error = errors.remove(0);
            error!("s3prune failed.");
            return Err(first_error);
        }
    }

    if pipeline.has_warning() {
        let not_deleted = indicator_summary.not_deleted_count();
        if ui_config::is_show_summary_needed(&config) {
            eprintln!("s3prune: {not_deleted} objects could not be deleted.");
        }
        debug!(not_deleted, "s3prune has been completed with warnings.");
    } else {
        debug!("s3prune has been completed.");
    }

    Ok(())
}
