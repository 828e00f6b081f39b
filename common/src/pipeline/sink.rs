use super::VerdictMessage;
use crate::db_util::SubmissionStore;
use log::{debug, error, info};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Write verdicts to the primary database one at a time.
///
/// The sink does not watch the stop signal: it runs until the fetcher and every reviewer
/// have dropped their senders, so verdicts of reviews finished during shutdown are written.
/// Failed updates are logged and dropped.
pub(crate) async fn run_verdict_sink(
    store: Arc<dyn SubmissionStore>,
    mut verdicts: mpsc::Receiver<VerdictMessage>,
) {
    while let Some(VerdictMessage { verdict, written }) = verdicts.recv().await {
        let submission_id = verdict.submission_id;
        let status = verdict.status;
        let store = Arc::clone(&store);
        let updated =
            match tokio::task::spawn_blocking(move || store.update_submission(&verdict)).await {
                Ok(Ok(())) => {
                    debug!("submission #{submission_id} updated: {status}");
                    true
                }
                Ok(Err(_)) | Err(_) => {
                    error!("submission update failed: submission_id={submission_id}");
                    false
                }
            };
        if let Some(written) = written {
            // the fetcher may have stopped waiting
            let _ = written.send(updated);
        }
    }

    info!("stopped verdict sink");
}
