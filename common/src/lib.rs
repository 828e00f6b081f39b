//! A library with common utilities for reviewing SQL selection submissions.
//!
//! Submissions are pulled from the primary database, executed against the target
//! schema they were written for, and compared with the task's reference solution.
//! The outcome of every review is written back to the primary database as a [`Verdict`].

pub mod config;
pub mod db_util;
pub mod job;
pub mod normalize;
pub mod pipeline;
pub mod review;
pub mod shutdown;
pub mod verdict;

#[cfg(test)]
pub(crate) mod test_support;

pub use job::Job;
pub use verdict::{Status, Verdict};

/// The shortest period allowed between two fetches of pending jobs.
pub const MIN_FETCH_PERIOD_MS: u64 = 100;
/// Capacity of the job and verdict queues when none is configured.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;
/// Connections kept open per database when none is configured.
pub const DEFAULT_POOL_SIZE: u32 = 4;
