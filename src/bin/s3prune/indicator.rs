// Progress indicator for the s3prune binary.
//
// Reads DeletionStatistics from the stats channel, prints one line per
// deleted batch and keeps a live progress line with a moving-average rate.

use async_channel::Receiver;
use indicatif::{HumanCount, ProgressBar, ProgressStyle};
use s3prune_rs::DeletionStatistics;
use simple_moving_average::{SMA, SumTreeSMA};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

/// Totals seen on the stats channel, returned once it closes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndicatorSummary {
    pub total_listed_count: u64,
    pub total_matched_count: u64,
    pub total_delete_count: u64,
    pub total_error_count: u64,
    pub total_warning_count: u64,
}

impl IndicatorSummary {
    /// Objects that were candidates but are still in the bucket.
    pub fn not_deleted_count(&self) -> u64 {
        self.total_error_count + self.total_warning_count
    }

    fn apply(&mut self, stats: &DeletionStatistics) -> u64 {
        match stats {
            DeletionStatistics::ObjectsListed { listed, matched } => {
                self.total_listed_count += listed;
                self.total_matched_count += matched;
                0
            }
            DeletionStatistics::DeleteComplete { count } => {
                self.total_delete_count += count;
                *count
            }
            DeletionStatistics::DeleteError { count } => {
                self.total_error_count += count;
                0
            }
            DeletionStatistics::DeleteWarning { .. } => {
                self.total_warning_count += 1;
                0
            }
        }
    }
}

/// Moving average window in seconds (samples).
const MOVING_AVERAGE_PERIOD_SECS: usize = 10;

/// How often (in seconds) to refresh the progress display.
const REFRESH_INTERVAL: f32 = 1.0;

/// Spawn a background task that reads deletion statistics until the channel
/// closes.
///
/// - `show_progress` - keep a live-updating progress line
/// - `show_batch_result` - print `Deleted <n> objects` for every deleted batch
pub fn show_indicator(
    stats_receiver: Receiver<DeletionStatistics>,
    show_progress: bool,
    show_batch_result: bool,
) -> JoinHandle<IndicatorSummary> {
    let progress_text = if show_progress {
        ProgressBar::new(0)
    } else {
        ProgressBar::hidden()
    };
    if let Ok(progress_style) = ProgressStyle::with_template("{wide_msg}") {
        progress_text.set_style(progress_style);
    }

    tokio::spawn(async move {
        let mut ma_deleted_count = SumTreeSMA::<_, u64, MOVING_AVERAGE_PERIOD_SECS>::new();
        let mut summary = IndicatorSummary::default();

        loop {
            let mut period_count: u64 = 0;

            let period = Instant::now();
            loop {
                while let Ok(stats) = stats_receiver.try_recv() {
                    let deleted = summary.apply(&stats);
                    period_count += deleted;

                    if show_batch_result && 0 < deleted {
                        progress_text.suspend(|| println!("Deleted {deleted} objects"));
                    }
                }

                if REFRESH_INTERVAL < period.elapsed().as_secs_f32() {
                    break;
                }

                if stats_receiver.is_closed() && stats_receiver.is_empty() {
                    progress_text.finish_and_clear();
                    debug!(
                        listed = summary.total_listed_count,
                        matched = summary.total_matched_count,
                        deleted = summary.total_delete_count,
                        "progress indicator has been completed."
                    );
                    return summary;
                }

                tokio::time::sleep(std::time::Duration::from_secs_f32(0.05)).await;
            }

            ma_deleted_count.add_sample(period_count);

            if show_progress {
                progress_text.set_message(format!(
                    "deleted {:>3} objects | {:>3} objects/sec,  matched {} objects,  listed {} objects,  failed {} objects",
                    summary.total_delete_count,
                    HumanCount(ma_deleted_count.get_average()),
                    summary.total_matched_count,
                    summary.total_listed_count,
                    summary.not_deleted_count(),
                ));
            }
        }
    })
}
