use super::conversions::{deserialize_check_order, i64_to_u64, u64_to_i64};
use super::{PgPool, SubmissionStore};
use crate::{Job, Status, Verdict};
use anyhow::{Context, Result, anyhow};
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Integer, Text};

diesel::table! {
    submissions (id) {
        id -> BigInt,
        status_id -> Integer,
        reviewer_message -> Nullable<Text>,
    }
}

const FETCH_PENDING_SELECTION_JOBS: &str = "SELECT s.id AS submission_id,
        s.solution,
        t.reference_solution,
        t.schema_name,
        t.check_order
    FROM submissions s
    JOIN tasks t ON t.id = s.task_id
    WHERE s.status_id = $1
    AND t.task_type = 'selection'
    ORDER BY s.id;";

const FETCH_TASK_RESTRICTIONS: &str = "SELECT r.restriction
    FROM task_restrictions r
    JOIN submissions s ON s.task_id = r.task_id
    WHERE s.id = $1
    ORDER BY r.position;";

#[derive(QueryableByName)]
struct PendingJobPrivate {
    #[diesel(sql_type = BigInt)]
    submission_id: i64,
    #[diesel(sql_type = Text)]
    solution: String,
    #[diesel(sql_type = Text)]
    reference_solution: String,
    #[diesel(sql_type = Text)]
    schema_name: String,
    #[diesel(sql_type = Text)]
    check_order: String,
}

#[derive(QueryableByName)]
struct RestrictionPrivate {
    #[diesel(sql_type = Text)]
    restriction: String,
}

fn private_to_public(p: PendingJobPrivate) -> Result<Job> {
    Ok(Job {
        submission_id: i64_to_u64(p.submission_id).map_err(|e| anyhow!(e))?,
        solution: p.solution,
        reference_solution: p.reference_solution,
        schema_name: p.schema_name,
        check_order: deserialize_check_order(&p.check_order),
    })
}

/// The primary database, shared by the fetcher, the reviewers and the verdict sink.
#[derive(Clone)]
pub struct PgSubmissionStore {
    pool: PgPool,
}

impl PgSubmissionStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl SubmissionStore for PgSubmissionStore {
    fn fetch_pending_jobs(&self) -> Result<Vec<Job>> {
        let mut conn = self.pool.get().context("no primary database connection")?;

        let rows: Vec<PendingJobPrivate> = sql_query(FETCH_PENDING_SELECTION_JOBS)
            .bind::<Integer, _>(Status::PendingReview.code())
            .load(&mut conn)?;

        rows.into_iter().map(private_to_public).collect()
    }

    fn fetch_restrictions(&self, submission_id: u64) -> Result<Vec<String>> {
        let mut conn = self.pool.get().context("no primary database connection")?;
        let row_id = u64_to_i64(submission_id).map_err(|e| anyhow!(e))?;

        let rows: Vec<RestrictionPrivate> = sql_query(FETCH_TASK_RESTRICTIONS)
            .bind::<BigInt, _>(row_id)
            .load(&mut conn)?;

        Ok(rows.into_iter().map(|row| row.restriction).collect())
    }

    fn update_submission(&self, verdict: &Verdict) -> Result<()> {
        use self::submissions::dsl::*;

        let mut conn = self.pool.get().context("no primary database connection")?;
        let row_id = u64_to_i64(verdict.submission_id).map_err(|e| anyhow!(e))?;

        let updated = diesel::update(submissions.filter(id.eq(row_id)))
            .set((
                status_id.eq(verdict.status.code()),
                reviewer_message.eq(verdict.message.as_deref()),
            ))
            .execute(&mut conn)?;

        if updated == 0 {
            return Err(anyhow!("submission #{} does not exist", verdict.submission_id));
        }
        Ok(())
    }
}
