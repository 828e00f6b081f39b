//! Interfaces between the review pipeline and the databases it talks to.
//!
//! The pipeline only sees the [`SubmissionStore`] and [`TargetDatabase`] traits. The
//! diesel-backed implementations live behind the `database` feature.

use crate::{Job, Verdict};
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;

pub mod conversions;

#[cfg(feature = "database")]
mod connection;
#[cfg(feature = "database")]
mod primary;
#[cfg(feature = "database")]
mod target;

#[cfg(feature = "database")]
pub use connection::{PgPool, connect_pool};
#[cfg(feature = "database")]
pub use primary::PgSubmissionStore;
#[cfg(feature = "database")]
pub use target::{PgTargetDatabase, connect_target_pool};

/// The primary database: where jobs come from and where verdicts go.
pub trait SubmissionStore: Send + Sync {
    /// All selection submissions currently waiting for review,
    /// in the order they should be reviewed.
    ///
    /// # Errors
    /// Returns an error if the query fails or any row cannot be converted.
    fn fetch_pending_jobs(&self) -> Result<Vec<Job>>;

    /// The forbidden tokens of the task a submission belongs to, in task order.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    fn fetch_restrictions(&self, submission_id: u64) -> Result<Vec<String>>;

    /// Record a verdict as the submission's current status and reviewer message.
    ///
    /// # Errors
    /// Returns an error if the update fails.
    fn update_submission(&self, verdict: &Verdict) -> Result<()>;
}

/// A schema that solutions are executed against.
/// Both methods return the number of rows that differ between the two result sets.
pub trait TargetDatabase: Send + Sync {
    /// Rows in one result set but not the other, ignoring row order.
    ///
    /// # Errors
    /// Returns the database error if either solution fails to execute.
    fn content_difference(&self, candidate: &str, reference: &str) -> Result<u64>;

    /// Like [`TargetDatabase::content_difference`], but rows are also compared by position.
    ///
    /// # Errors
    /// Returns the database error if either solution fails to execute.
    fn order_difference(&self, candidate: &str, reference: &str) -> Result<u64>;
}

/// Target schemas by name. Built once at startup and never changed afterwards.
#[derive(Clone, Default)]
pub struct TargetPool {
    targets: HashMap<String, Arc<dyn TargetDatabase>>,
}

impl TargetPool {
    #[must_use]
    pub fn new(targets: HashMap<String, Arc<dyn TargetDatabase>>) -> Self {
        Self { targets }
    }

    #[must_use]
    pub fn get(&self, schema_name: &str) -> Option<&Arc<dyn TargetDatabase>> {
        self.targets.get(schema_name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl FromIterator<(String, Arc<dyn TargetDatabase>)> for TargetPool {
    fn from_iter<I: IntoIterator<Item = (String, Arc<dyn TargetDatabase>)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Wrap a comparison template so it yields a single count of differing rows.
/// The template keeps its `$1`/`$2` placeholders; solutions are always bound, never spliced in.
#[must_use]
pub fn difference_count_query(template: &str) -> String {
    let template = template.trim().trim_end_matches(';').trim_end();
    format!("SELECT COUNT(*) AS difference_rows FROM ({template}) AS difference")
}
