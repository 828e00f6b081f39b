use super::VerdictMessage;
use crate::db_util::SubmissionStore;
use crate::{Job, Verdict};
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Fetch pending jobs on every tick until cancelled.
/// A tick that runs long causes the following ticks to be skipped rather than queued.
pub(crate) async fn run_fetcher(
    store: Arc<dyn SubmissionStore>,
    period: Duration,
    jobs: mpsc::Sender<Job>,
    verdicts: mpsc::Sender<VerdictMessage>,
    token: CancellationToken,
) {
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            () = token.cancelled() => break,
            _ = ticker.tick() => {}
        }
        if !fetch_jobs(&store, &jobs, &verdicts, &token).await {
            break;
        }
    }

    info!("stopped fetching selection jobs");
}

/// Forward every pending job, marking it as on review first.
///
/// A job is only queued once its OnReview status is stored, so the next fetch can no longer
/// see it as pending. Jobs that could not be marked stay pending and come back on a later tick.
/// Returns false once the pipeline is shutting down.
async fn fetch_jobs(
    store: &Arc<dyn SubmissionStore>,
    jobs: &mpsc::Sender<Job>,
    verdicts: &mpsc::Sender<VerdictMessage>,
    token: &CancellationToken,
) -> bool {
    let pending = {
        let store = Arc::clone(store);
        match tokio::task::spawn_blocking(move || store.fetch_pending_jobs()).await {
            Ok(Ok(pending)) => pending,
            Ok(Err(err)) => {
                error!("failed fetching selection jobs: {err:#}");
                return true;
            }
            Err(err) => {
                error!("selection job fetch panicked: {err}");
                return true;
            }
        }
    };

    if !pending.is_empty() {
        debug!("fetched {} selection jobs", pending.len());
    }

    for job in pending {
        match mark_on_review(verdicts, job.submission_id, token).await {
            Some(true) => {}
            Some(false) => {
                warn!(
                    "submission #{} could not be marked on review, leaving it for the next fetch",
                    job.submission_id
                );
                continue;
            }
            None => return false,
        }
        if !send(jobs, job, token).await {
            return false;
        }
    }
    true
}

/// Hand an OnReview verdict to the sink and wait until it has been written.
/// Returns whether the write succeeded, or `None` if the pipeline stopped first.
async fn mark_on_review(
    verdicts: &mpsc::Sender<VerdictMessage>,
    submission_id: u64,
    token: &CancellationToken,
) -> Option<bool> {
    let (written_tx, written_rx) = oneshot::channel();
    let message = VerdictMessage {
        verdict: Verdict::on_review(submission_id),
        written: Some(written_tx),
    };
    if !send(verdicts, message, token).await {
        return None;
    }
    tokio::select! {
        biased;
        () = token.cancelled() => None,
        written = written_rx => Some(written.unwrap_or(false)),
    }
}

/// Wait for queue space unless the pipeline is cancelled first.
async fn send<T>(queue: &mpsc::Sender<T>, item: T, token: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        () = token.cancelled() => false,
        sent = queue.send(item) => sent.is_ok(),
    }
}
