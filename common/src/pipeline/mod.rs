//! The concurrent review pipeline.
//!
//! One fetcher task pulls pending jobs from the primary database, a fixed number of
//! reviewer tasks turn jobs into verdicts, and a single sink task writes the verdicts back:
//!
//! ```text
//! primary DB -> fetcher -> job queue -> reviewers -> verdict queue -> sink -> primary DB
//!                  \______________________________________/
//!                         OnReview verdict per fetched job
//! ```
//!
//! The fetcher and reviewers watch the same
//! [`CancellationToken`](tokio_util::sync::CancellationToken) and exit at their next wait once
//! it is cancelled. The sink keeps writing until every sender is gone, so a review that was
//! already running when the token fired still gets its verdict written. [`Judges`] owns the
//! lifecycle.

mod fetcher;
mod judges;
mod reviewers;
mod sink;

pub use judges::{Judges, SelectionSettings};

use crate::{Job, Verdict};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc, oneshot};

/// The receiving end of the job queue, shared by all reviewers.
pub(crate) type SharedJobs = Arc<Mutex<mpsc::Receiver<Job>>>;

/// A verdict on its way to the sink.
/// `written` is told whether the update reached the primary database.
pub(crate) struct VerdictMessage {
    pub verdict: Verdict,
    pub written: Option<oneshot::Sender<bool>>,
}

impl From<Verdict> for VerdictMessage {
    fn from(verdict: Verdict) -> Self {
        Self {
            verdict,
            written: None,
        }
    }
}
