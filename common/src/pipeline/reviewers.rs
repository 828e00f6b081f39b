use super::{SharedJobs, VerdictMessage};
use crate::Verdict;
use crate::review::Reviewer;
use log::{debug, error, info};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Take jobs off the shared queue and review them until cancelled.
/// A job that has been taken is always reviewed to the end and its verdict handed to the sink.
pub(crate) async fn run_reviewer(
    reviewer_id: usize,
    reviewer: Arc<Reviewer>,
    jobs: SharedJobs,
    verdicts: mpsc::Sender<VerdictMessage>,
    token: CancellationToken,
) {
    loop {
        let job = tokio::select! {
            biased;
            () = token.cancelled() => None,
            job = async { jobs.lock().await.recv().await } => job,
        };
        let Some(job) = job else {
            break;
        };

        let submission_id = job.submission_id;
        let verdict = {
            let reviewer = Arc::clone(&reviewer);
            match tokio::task::spawn_blocking(move || reviewer.review(&job)).await {
                Ok(verdict) => verdict,
                Err(err) => {
                    error!(
                        "review panicked: reviewer_id={reviewer_id}, submission_id={submission_id}"
                    );
                    Verdict::execution_error(submission_id, format!("review aborted: {err}"))
                }
            }
        };
        debug!(
            "reviewer {reviewer_id} reviewed submission #{submission_id}: {}",
            verdict.status
        );

        // the sink outlives the stop signal, so a finished review is always handed over
        if verdicts.send(verdict.into()).await.is_err() {
            break;
        }
    }

    info!("stopped selection reviewer: reviewer_id={reviewer_id}");
}
