use super::{SharedJobs, fetcher, reviewers, sink};
use crate::db_util::{SubmissionStore, TargetPool};
use crate::review::Reviewer;
use anyhow::{Context, Result};
use log::info;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

#[cfg(feature = "database")]
use crate::config::JudgesConfig;
#[cfg(feature = "database")]
use crate::db_util::{PgSubmissionStore, connect_pool, connect_target_pool};

/// Runtime settings for the selection judge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionSettings {
    pub fetch_period: Duration,
    pub reviewer_count: usize,
    pub queue_capacity: usize,
}

/// Owns the pipeline tasks: starts them in order, stops them together, waits for them to finish.
pub struct Judges {
    token: CancellationToken,
    tracker: TaskTracker,
}

impl Judges {
    #[must_use]
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            tracker: TaskTracker::new(),
        }
    }

    /// Connect the primary database and every target schema, then start the pipeline.
    ///
    /// # Errors
    /// Returns an error if any database cannot be connected.
    #[cfg(feature = "database")]
    pub async fn start(&self, config: &JudgesConfig) -> Result<()> {
        let main_db = config.main_db.clone();
        let pool_size = config.selection_judge.pool_size;
        let pool = tokio::task::spawn_blocking(move || {
            connect_pool(&main_db.connection_string(), pool_size)
        })
        .await
        .context("main database connection task failed")?
        .context("failed to connect main database")?;
        info!(
            "main database connected: {}",
            config.main_db.masked_connection_string()
        );

        let store: Arc<dyn SubmissionStore> = Arc::new(PgSubmissionStore::new(pool));
        let selection = config.selection_judge.clone();
        self.start_with(selection.settings(), store, move || {
            connect_target_pool(&selection)
        })
        .await
    }

    /// Start the pipeline on an already connected primary database.
    ///
    /// The verdict sink starts first, then the target schemas are connected, then the
    /// fetcher and reviewers start. If the targets cannot be connected everything already
    /// started is stopped again: the sink ends once its senders are dropped on return.
    ///
    /// # Errors
    /// Returns the error from `connect_targets`.
    pub async fn start_with<F>(
        &self,
        settings: SelectionSettings,
        store: Arc<dyn SubmissionStore>,
        connect_targets: F,
    ) -> Result<()>
    where
        F: FnOnce() -> Result<TargetPool> + Send + 'static,
    {
        let (verdict_tx, verdict_rx) = mpsc::channel(settings.queue_capacity);
        self.tracker.spawn(sink::run_verdict_sink(Arc::clone(&store), verdict_rx));

        let (job_tx, job_rx) = mpsc::channel(settings.queue_capacity);
        let jobs: SharedJobs = Arc::new(Mutex::new(job_rx));

        let targets = match tokio::task::spawn_blocking(connect_targets)
            .await
            .context("target connection task failed")
            .and_then(|connected| connected)
        {
            Ok(targets) => targets,
            Err(err) => {
                self.stop();
                self.tracker.close();
                return Err(err);
            }
        };
        info!("{} selection DBs connected", targets.len());

        let reviewer = Arc::new(Reviewer::new(Arc::clone(&store), Arc::new(targets)));

        self.tracker.spawn(fetcher::run_fetcher(
            store,
            settings.fetch_period,
            job_tx,
            verdict_tx.clone(),
            self.token.clone(),
        ));
        for reviewer_id in 1..=settings.reviewer_count {
            self.tracker.spawn(reviewers::run_reviewer(
                reviewer_id,
                Arc::clone(&reviewer),
                Arc::clone(&jobs),
                verdict_tx.clone(),
                self.token.clone(),
            ));
        }
        self.tracker.close();

        info!(
            "selection judge started: reviewers={}, fetch_period={}ms",
            settings.reviewer_count,
            settings.fetch_period.as_millis()
        );
        Ok(())
    }

    /// Signal every task to stop at its next wait.
    pub fn stop(&self) {
        self.token.cancel();
    }

    /// Wait until every started task has exited, including the sink writing the
    /// verdicts of reviews that were running when [`Judges::stop`] was called.
    pub async fn wait(&self) {
        self.tracker.wait().await;
    }
}
