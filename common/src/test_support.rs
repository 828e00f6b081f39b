//! In-memory stand-ins for the databases.

use crate::db_util::{SubmissionStore, TargetDatabase};
use crate::{Job, Status, Verdict};
use anyhow::{Result, anyhow};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

pub fn job(submission_id: u64, schema_name: &str, check_order: bool) -> Job {
    Job {
        submission_id,
        solution: format!("select * from items where id = {submission_id};"),
        reference_solution: format!("select * from items where id = {submission_id}"),
        schema_name: schema_name.to_string(),
        check_order,
    }
}

/// Serves queued fetch results in order, then empty fetches. Records every update.
#[derive(Default)]
pub struct FakeStore {
    fetches: Mutex<VecDeque<Result<Vec<Job>, String>>>,
    restrictions: HashMap<u64, Result<Vec<String>, String>>,
    failing_updates: HashSet<u64>,
    updates: Mutex<Vec<Verdict>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fetch(self, fetch: Result<Vec<Job>, String>) -> Self {
        self.fetches.lock().unwrap().push_back(fetch);
        self
    }

    pub fn with_restrictions(
        mut self,
        submission_id: u64,
        restrictions: Result<Vec<String>, String>,
    ) -> Self {
        self.restrictions.insert(submission_id, restrictions);
        self
    }

    pub fn with_failing_update(mut self, submission_id: u64) -> Self {
        self.failing_updates.insert(submission_id);
        self
    }

    pub fn updates(&self) -> Vec<Verdict> {
        self.updates.lock().unwrap().clone()
    }
}

impl SubmissionStore for FakeStore {
    fn fetch_pending_jobs(&self) -> Result<Vec<Job>> {
        match self.fetches.lock().unwrap().pop_front() {
            Some(fetch) => fetch.map_err(|e| anyhow!(e)),
            None => Ok(Vec::new()),
        }
    }

    fn fetch_restrictions(&self, submission_id: u64) -> Result<Vec<String>> {
        match self.restrictions.get(&submission_id) {
            Some(restrictions) => restrictions.clone().map_err(|e| anyhow!(e)),
            None => Ok(Vec::new()),
        }
    }

    fn update_submission(&self, verdict: &Verdict) -> Result<()> {
        if self.failing_updates.contains(&verdict.submission_id) {
            return Err(anyhow!("update rejected"));
        }
        self.updates.lock().unwrap().push(verdict.clone());
        Ok(())
    }
}

/// Answers every comparison with a fixed result and counts the calls.
pub struct FakeTarget {
    content: Result<u64, String>,
    order: Result<u64, String>,
    delay: Duration,
    content_calls: AtomicUsize,
    order_calls: AtomicUsize,
    last_content_args: Mutex<Option<(String, String)>>,
}

impl FakeTarget {
    pub fn new(content: Result<u64, String>, order: Result<u64, String>) -> Self {
        Self {
            content,
            order,
            delay: Duration::ZERO,
            content_calls: AtomicUsize::new(0),
            order_calls: AtomicUsize::new(0),
            last_content_args: Mutex::new(None),
        }
    }

    /// A target where every candidate matches its reference.
    pub fn matching() -> Self {
        Self::new(Ok(0), Ok(0))
    }

    /// Make every content comparison take `delay`, like a slow query would.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn content_calls(&self) -> usize {
        self.content_calls.load(Ordering::SeqCst)
    }

    pub fn order_calls(&self) -> usize {
        self.order_calls.load(Ordering::SeqCst)
    }

    pub fn last_content_args(&self) -> Option<(String, String)> {
        self.last_content_args.lock().unwrap().clone()
    }
}

impl TargetDatabase for FakeTarget {
    fn content_difference(&self, candidate: &str, reference: &str) -> Result<u64> {
        self.content_calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.delay);
        *self.last_content_args.lock().unwrap() =
            Some((candidate.to_string(), reference.to_string()));
        self.content.clone().map_err(|e| anyhow!(e))
    }

    fn order_difference(&self, _candidate: &str, _reference: &str) -> Result<u64> {
        self.order_calls.fetch_add(1, Ordering::SeqCst);
        self.order.clone().map_err(|e| anyhow!(e))
    }
}

/// Reports a job as pending for as long as its stored status is PendingReview,
/// the way the primary database does. Every update takes `update_delay`.
pub struct StatusStore {
    jobs: Vec<Job>,
    update_delay: Duration,
    statuses: Mutex<HashMap<u64, Status>>,
    updates: Mutex<Vec<Verdict>>,
}

impl StatusStore {
    pub fn new(jobs: Vec<Job>, update_delay: Duration) -> Self {
        let statuses = jobs
            .iter()
            .map(|job| (job.submission_id, Status::PendingReview))
            .collect();
        Self {
            jobs,
            update_delay,
            statuses: Mutex::new(statuses),
            updates: Mutex::new(Vec::new()),
        }
    }

    pub fn updates(&self) -> Vec<Verdict> {
        self.updates.lock().unwrap().clone()
    }
}

impl SubmissionStore for StatusStore {
    fn fetch_pending_jobs(&self) -> Result<Vec<Job>> {
        let statuses = self.statuses.lock().unwrap();
        Ok(self
            .jobs
            .iter()
            .filter(|job| statuses.get(&job.submission_id) == Some(&Status::PendingReview))
            .cloned()
            .collect())
    }

    fn fetch_restrictions(&self, _submission_id: u64) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn update_submission(&self, verdict: &Verdict) -> Result<()> {
        thread::sleep(self.update_delay);
        self.statuses
            .lock()
            .unwrap()
            .insert(verdict.submission_id, verdict.status);
        self.updates.lock().unwrap().push(verdict.clone());
        Ok(())
    }
}
