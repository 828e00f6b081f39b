//! A submission waiting to be reviewed.

/// One submission's candidate solution paired with the reference solution of its task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub submission_id: u64,
    pub solution: String,
    pub reference_solution: String,
    /// Name of the target schema both solutions are executed against.
    pub schema_name: String,
    /// Whether the rows must also come back in the reference order.
    pub check_order: bool,
}
