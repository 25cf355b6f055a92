use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::registry::{Assignment, AssignmentKind, GradeRecord, ReviewDecision, ScoreInput};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AssignmentCreate {
    #[serde(default)]
    pub(crate) id: Option<String>,
    #[serde(alias = "classId")]
    #[validate(length(min = 1, message = "class_id must not be empty"))]
    pub(crate) class_id: String,
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(alias = "maxScore")]
    #[validate(range(min = 1, message = "max_score must be positive"))]
    pub(crate) max_score: u32,
    pub(crate) kind: AssignmentKind,
    /// `YYYY-MM-DD`; today (UTC) when omitted.
    #[serde(default)]
    pub(crate) date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReviewRequest {
    pub(crate) decision: ReviewDecision,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GradeUpdate {
    #[serde(default)]
    pub(crate) score: Option<ScoreInput>,
    #[serde(default)]
    pub(crate) remark: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AssignmentResponse {
    #[serde(flatten)]
    pub(crate) assignment: Assignment,
    pub(crate) records: Vec<GradeRecord>,
}
