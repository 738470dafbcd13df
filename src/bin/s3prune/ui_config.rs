// Decides what the binary prints to the console besides tracing output.

use s3prune_rs::Config;

/// Whether to show the live-updating progress line.
///
/// Returns `false` when:
/// - `show_no_progress` is set
/// - Verbosity is above Warn (tracing takes over the terminal)
/// - JSON logging is enabled (progress text would corrupt JSON output)
pub fn is_progress_indicator_needed(config: &Config) -> bool {
    if config.show_no_progress {
        return false;
    }

    match config.tracing_config.as_ref() {
        None => true,
        Some(tracing_config) => {
            tracing_config.tracing_level <= log::Level::Warn && !tracing_config.json_tracing
        }
    }
}

/// Whether to print `Deleted <n> objects` for each deleted batch.
pub fn is_batch_result_needed(config: &Config) -> bool {
    if config.show_no_progress {
        return false;
    }

    !is_json_tracing(config)
}

/// Whether to print the final summary line.
pub fn is_show_summary_needed(config: &Config) -> bool {
    !is_json_tracing(config)
}

fn is_json_tracing(config: &Config) -> bool {
    config
        .tracing_config
        .as_ref()
        .is_some_and(|tracing_config| tracing_config.json_tracing)
}
