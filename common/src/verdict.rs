//! Submission statuses and the verdicts that move a submission between them.

use std::fmt;

/// Every status a submission can be in.
/// The discriminants are the status ids stored in the primary database.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Status {
    Unknown = 0,
    PendingReview = 1,
    OnReview = 2,
    Accepted = 3,
    ExecutionError = 4,
    RestrictionViolated = 5,
    IncorrectContent = 6,
    IncorrectOrder = 7,
}

impl Status {
    /// The status id as stored in the primary database.
    #[must_use]
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Whether this status ends the review of a submission.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Status::Accepted
                | Status::ExecutionError
                | Status::RestrictionViolated
                | Status::IncorrectContent
                | Status::IncorrectOrder
        )
    }
}

impl TryFrom<i32> for Status {
    type Error = String;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Status::Unknown),
            1 => Ok(Status::PendingReview),
            2 => Ok(Status::OnReview),
            3 => Ok(Status::Accepted),
            4 => Ok(Status::ExecutionError),
            5 => Ok(Status::RestrictionViolated),
            6 => Ok(Status::IncorrectContent),
            7 => Ok(Status::IncorrectOrder),
            other => Err(format!("{other} is not a valid submission status id")),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Unknown => "unknown",
            Status::PendingReview => "pending review",
            Status::OnReview => "on review",
            Status::Accepted => "accepted",
            Status::ExecutionError => "execution error",
            Status::RestrictionViolated => "restriction violated",
            Status::IncorrectContent => "incorrect content",
            Status::IncorrectOrder => "incorrect order",
        };
        f.write_str(name)
    }
}

/// The outcome assigned to a submission, written back to the primary database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub submission_id: u64,
    pub status: Status,
    pub message: Option<String>,
}

impl Verdict {
    /// The transitional verdict sent as soon as a job is picked up.
    #[must_use]
    pub fn on_review(submission_id: u64) -> Self {
        Self {
            submission_id,
            status: Status::OnReview,
            message: None,
        }
    }

    /// A verdict that ends the review of a submission.
    #[must_use]
    pub fn terminal(submission_id: u64, status: Status, message: Option<String>) -> Self {
        debug_assert!(status.is_terminal(), "{status} is not a terminal status");
        Self {
            submission_id,
            status,
            message,
        }
    }

    #[must_use]
    pub fn accepted(submission_id: u64) -> Self {
        Self::terminal(submission_id, Status::Accepted, None)
    }

    #[must_use]
    pub fn execution_error(submission_id: u64, message: impl Into<String>) -> Self {
        Self::terminal(submission_id, Status::ExecutionError, Some(message.into()))
    }
}
