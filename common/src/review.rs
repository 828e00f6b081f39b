//! The review of a single selection job.

use crate::db_util::{SubmissionStore, TargetPool};
use crate::normalize::{find_violation, normalize_solution};
use crate::{Job, Status, Verdict};
use log::{debug, error};
use std::sync::Arc;

/// Reviews jobs against the target schemas. Shared by every reviewer task.
pub struct Reviewer {
    store: Arc<dyn SubmissionStore>,
    targets: Arc<TargetPool>,
}

impl Reviewer {
    #[must_use]
    pub fn new(store: Arc<dyn SubmissionStore>, targets: Arc<TargetPool>) -> Self {
        Self { store, targets }
    }

    /// Decide the terminal verdict for a job.
    ///
    /// The checks run in a fixed order and the first failing one decides the verdict:
    /// target lookup, restrictions, result content, then result order if the task asks for it.
    /// This blocks on database round-trips.
    #[must_use]
    pub fn review(&self, job: &Job) -> Verdict {
        let submission_id = job.submission_id;
        let solution = normalize_solution(&job.solution);
        let reference = normalize_solution(&job.reference_solution);

        let Some(target) = self.targets.get(&job.schema_name) else {
            error!(
                "selection DB does not exist: submission_id={submission_id}, database_name={}",
                job.schema_name
            );
            return Verdict::execution_error(
                submission_id,
                format!("unknown schema \"{}\"", job.schema_name),
            );
        };

        let restrictions = match self.store.fetch_restrictions(submission_id) {
            Ok(restrictions) => restrictions,
            Err(err) => {
                error!(
                    "failed to fetch task restrictions for submission #{submission_id}: {err:#}"
                );
                return Verdict::execution_error(submission_id, format!("{err:#}"));
            }
        };
        if let Some(token) = find_violation(&solution, &restrictions) {
            return Verdict::terminal(
                submission_id,
                Status::RestrictionViolated,
                Some(format!("\"{token}\" is restricted")),
            );
        }

        match target.content_difference(&solution, &reference) {
            Ok(0) => {}
            Ok(rows) => {
                debug!("submission #{submission_id}: {rows} rows differ in content");
                return Verdict::terminal(submission_id, Status::IncorrectContent, None);
            }
            Err(err) => {
                error!(
                    "error reviewing selection content for submission #{submission_id}: {err:#}"
                );
                return Verdict::execution_error(submission_id, format!("{err:#}"));
            }
        }

        if !job.check_order {
            return Verdict::accepted(submission_id);
        }

        match target.order_difference(&solution, &reference) {
            Ok(0) => Verdict::accepted(submission_id),
            Ok(rows) => {
                debug!("submission #{submission_id}: {rows} rows differ in order");
                Verdict::terminal(submission_id, Status::IncorrectOrder, None)
            }
            Err(err) => {
                error!(
                    "error reviewing selection order for submission #{submission_id}: {err:#}"
                );
                Verdict::execution_error(submission_id, format!("{err:#}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db_util::TargetDatabase;
    use crate::test_support::{FakeStore, FakeTarget, job};

    fn reviewer(store: FakeStore, target: &Arc<FakeTarget>) -> Reviewer {
        let targets: TargetPool = [(
            "SHOP".to_string(),
            Arc::clone(target) as Arc<dyn TargetDatabase>,
        )]
        .into_iter()
        .collect();
        Reviewer::new(Arc::new(store), Arc::new(targets))
    }

    #[test_log::test]
    fn test_matching_content_without_order_check_is_accepted() {
        let target = Arc::new(FakeTarget::matching());
        let verdict = reviewer(FakeStore::new(), &target).review(&job(1, "SHOP", false));
        assert_eq!(verdict, Verdict::accepted(1));
        assert_eq!(target.order_calls(), 0);
    }

    #[test_log::test]
    fn test_wrong_order_is_reported() {
        let target = Arc::new(FakeTarget::new(Ok(0), Ok(3)));
        let verdict = reviewer(FakeStore::new(), &target).review(&job(2, "SHOP", true));
        assert_eq!(verdict.status, Status::IncorrectOrder);
        assert_eq!(target.order_calls(), 1);
    }

    #[test_log::test]
    fn test_matching_order_is_accepted() {
        let target = Arc::new(FakeTarget::matching());
        let verdict = reviewer(FakeStore::new(), &target).review(&job(3, "SHOP", true));
        assert_eq!(verdict, Verdict::accepted(3));
    }

    #[test_log::test]
    fn test_wrong_content_skips_order_check() {
        for check_order in [false, true] {
            let target = Arc::new(FakeTarget::new(Ok(1), Ok(5)));
            let verdict =
                reviewer(FakeStore::new(), &target).review(&job(4, "SHOP", check_order));
            assert_eq!(verdict.status, Status::IncorrectContent);
            assert_eq!(target.order_calls(), 0);
        }
    }

    #[test_log::test]
    fn test_restriction_violation_names_first_token() {
        let store = FakeStore::new()
            .with_restrictions(5, Ok(vec!["union".to_string(), "drop".to_string()]));
        let target = Arc::new(FakeTarget::matching());
        let mut job = job(5, "SHOP", false);
        job.solution = "drop table x; select 1 union select 2".to_string();

        let verdict = reviewer(store, &target).review(&job);
        assert_eq!(verdict.status, Status::RestrictionViolated);
        assert_eq!(verdict.message.as_deref(), Some("\"union\" is restricted"));
        assert_eq!(target.content_calls(), 0);
    }

    #[test_log::test]
    fn test_restriction_fetch_failure_is_execution_error() {
        let store = FakeStore::new().with_restrictions(6, Err("connection reset".to_string()));
        let target = Arc::new(FakeTarget::matching());
        let verdict = reviewer(store, &target).review(&job(6, "SHOP", false));
        assert_eq!(verdict, Verdict::execution_error(6, "connection reset"));
    }

    #[test_log::test]
    fn test_query_failure_is_execution_error() {
        let target = Arc::new(FakeTarget::new(
            Err("syntax error at or near \"SELEC\"".to_string()),
            Ok(0),
        ));
        let verdict = reviewer(FakeStore::new(), &target).review(&job(7, "SHOP", true));
        assert_eq!(
            verdict,
            Verdict::execution_error(7, "syntax error at or near \"SELEC\"")
        );

        let target = Arc::new(FakeTarget::new(Ok(0), Err("division by zero".to_string())));
        let verdict = reviewer(FakeStore::new(), &target).review(&job(8, "SHOP", true));
        assert_eq!(verdict, Verdict::execution_error(8, "division by zero"));
    }

    #[test_log::test]
    fn test_unknown_schema_is_execution_error() {
        let target = Arc::new(FakeTarget::matching());
        let verdict = reviewer(FakeStore::new(), &target).review(&job(9, "MISSING", false));
        assert_eq!(verdict.status, Status::ExecutionError);
        assert_eq!(verdict.message.as_deref(), Some("unknown schema \"MISSING\""));
        assert_eq!(target.content_calls(), 0);
    }

    #[test_log::test]
    fn test_solutions_are_normalized_before_comparison() {
        let target = Arc::new(FakeTarget::matching());
        let mut job = job(10, "SHOP", false);
        job.solution = "  select name\nfrom items;\n".to_string();
        job.reference_solution = "SELECT name FROM items;".to_string();

        reviewer(FakeStore::new(), &target).review(&job);
        assert_eq!(
            target.last_content_args(),
            Some((
                "SELECT NAME FROM ITEMS".to_string(),
                "SELECT NAME FROM ITEMS".to_string()
            ))
        );
    }
}
