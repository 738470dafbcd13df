// Ctrl+C stops s3prune through the token shared by the scanner and the
// deletion workers.
//
// The scanner lists no further page and the workers take no new batch. A
// DeleteObjects request already sent is allowed to finish, so a cancelled run
// still ends with the summary line and exit code 0.

use s3prune_rs::PipelineCancellationToken;
use tokio::task::JoinHandle;
use tokio::{select, signal};
use tracing::{debug, warn};

/// Watch for Ctrl+C until the pipeline token is cancelled by someone else.
pub fn spawn_ctrl_c_handler(cancellation_token: PipelineCancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        select! {
            _ = cancellation_token.cancelled() => {
                debug!("pipeline cancelled, ctrl-c handler stopped.")
            }
            _ = signal::ctrl_c() => {
                warn!("ctrl-c received, no new batch will be deleted.");
                cancellation_token.cancel();
            }
        }
    })
}
