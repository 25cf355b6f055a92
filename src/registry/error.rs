use thiserror::Error;

use crate::registry::types::{BatchAction, GradeStatus};

/// Why a registry call was refused. The registry is left untouched whenever
/// one of these is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LifecycleError {
    #[error("assignment {0} not found")]
    AssignmentNotFound(String),
    #[error("grade record {0} not found")]
    GradeNotFound(String),
    #[error("student {0} not found")]
    StudentNotFound(String),
    #[error("assignment {0} already exists")]
    DuplicateAssignment(String),
    #[error("invalid assignment: {0}")]
    InvalidAssignment(String),
    #[error("invalid student: {0}")]
    InvalidStudent(String),
    #[error("invalid fee transaction: {0}")]
    InvalidTransaction(String),
    #[error("cannot {action} assignment {assignment_id} while it is {status}")]
    IllegalTransition { assignment_id: String, action: BatchAction, status: GradeStatus },
    #[error("grade record {grade_id} is {status} and can no longer be edited")]
    RecordLocked { grade_id: String, status: GradeStatus },
    #[error("score is not a number: {0}")]
    NonNumericScore(String),
    #[error("score {score} is outside 0..={max_score}")]
    ScoreOutOfRange { score: f64, max_score: u32 },
    #[error("assignment {assignment_id} has no record for students {missing:?}")]
    IncompleteBatch { assignment_id: String, missing: Vec<String> },
    #[error("results are locked for student {0}")]
    ResultsLocked(String),
}

impl LifecycleError {
    /// Stable label used in metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            LifecycleError::AssignmentNotFound(_)
            | LifecycleError::GradeNotFound(_)
            | LifecycleError::StudentNotFound(_) => "not_found",
            LifecycleError::DuplicateAssignment(_) => "duplicate",
            LifecycleError::InvalidAssignment(_)
            | LifecycleError::InvalidStudent(_)
            | LifecycleError::InvalidTransaction(_) => "invalid",
            LifecycleError::IllegalTransition { .. } => "illegal_transition",
            LifecycleError::RecordLocked { .. } => "locked",
            LifecycleError::NonNumericScore(_) | LifecycleError::ScoreOutOfRange { .. } => {
                "invalid_score"
            }
            LifecycleError::IncompleteBatch { .. } => "incomplete_batch",
            LifecycleError::ResultsLocked(_) => "results_locked",
        }
    }
}
