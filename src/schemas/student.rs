use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::registry::{FeeTransaction, GradeRecord, TransactionKind};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct StudentCreate {
    #[validate(length(min = 1, message = "id must not be empty"))]
    pub(crate) id: String,
    #[serde(alias = "fullName")]
    #[validate(length(min = 1, message = "full_name must not be empty"))]
    pub(crate) full_name: String,
    #[serde(alias = "classId")]
    #[validate(length(min = 1, message = "class_id must not be empty"))]
    pub(crate) class_id: String,
    /// Left out on a re-save, the stored flag is kept.
    #[serde(default)]
    #[serde(alias = "resultsUnlocked")]
    pub(crate) results_unlocked: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentResponse {
    pub(crate) id: String,
    pub(crate) full_name: String,
    pub(crate) class_id: String,
    pub(crate) results_unlocked: bool,
    pub(crate) created: bool,
    pub(crate) records_created: usize,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct TransactionCreate {
    #[serde(default)]
    pub(crate) id: Option<String>,
    pub(crate) kind: TransactionKind,
    #[validate(range(exclusive_min = 0.0, message = "amount must be positive"))]
    pub(crate) amount: f64,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default)]
    pub(crate) date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResultsLockRequest {
    pub(crate) unlocked: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct FeeAccountResponse {
    pub(crate) student_id: String,
    pub(crate) balance: f64,
    pub(crate) results_unlocked: bool,
    pub(crate) results_visible: bool,
    pub(crate) transactions: Vec<FeeTransaction>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResultsResponse {
    pub(crate) student_id: String,
    pub(crate) records: Vec<GradeRecord>,
}
