use serde::{Deserialize, Serialize};
use time::Date;

use crate::core::time::iso_date;
use crate::registry::error::LifecycleError;
use crate::registry::types::{AssignmentKind, BatchAction, GradeStatus, TransactionKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub full_name: String,
    pub class_id: String,
    #[serde(default)]
    pub results_unlocked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: String,
    pub class_id: String,
    pub title: String,
    pub max_score: u32,
    pub kind: AssignmentKind,
    #[serde(with = "iso_date")]
    pub date: Date,
}

/// One pupil's score on one assignment, as handed out to callers.
///
/// `status` is copied from the owning batch when the record is materialised;
/// mutating a returned record never reaches the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeRecord {
    pub id: String,
    pub assignment_id: String,
    pub student_id: String,
    pub score: f64,
    pub status: GradeStatus,
    #[serde(default)]
    pub remark: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeTransaction {
    pub id: String,
    pub student_id: String,
    pub kind: TransactionKind,
    pub amount: f64,
    #[serde(default)]
    pub description: String,
    #[serde(with = "iso_date")]
    pub date: Date,
}

#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub id: Option<String>,
    pub class_id: String,
    pub title: String,
    pub max_score: u32,
    pub kind: AssignmentKind,
    pub date: Date,
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub id: Option<String>,
    pub student_id: String,
    pub kind: TransactionKind,
    pub amount: f64,
    pub description: String,
    pub date: Date,
}

/// Raw score as typed into a gradebook cell: either a JSON number or text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScoreInput {
    Number(f64),
    Text(String),
}

impl ScoreInput {
    pub fn to_value(&self) -> Result<f64, LifecycleError> {
        let value = match self {
            ScoreInput::Number(value) => *value,
            ScoreInput::Text(raw) => raw
                .trim()
                .parse::<f64>()
                .map_err(|_| LifecycleError::NonNumericScore(raw.clone()))?,
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(LifecycleError::NonNumericScore(value.to_string()))
        }
    }
}

impl From<f64> for ScoreInput {
    fn from(value: f64) -> Self {
        ScoreInput::Number(value)
    }
}

impl From<&str> for ScoreInput {
    fn from(value: &str) -> Self {
        ScoreInput::Text(value.to_string())
    }
}

/// Outcome of a successful batch transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusChange {
    pub assignment_id: String,
    pub action: BatchAction,
    pub from: GradeStatus,
    pub to: GradeStatus,
    pub records: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentSummary {
    pub assignment_id: String,
    pub title: String,
    pub status: GradeStatus,
    pub max_score: u32,
    pub records: usize,
    pub mean_score: Option<f64>,
    pub highest_score: Option<f64>,
    pub lowest_score: Option<f64>,
}

/// Wire shape of the shared store, used both for refresh and export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
    #[serde(default)]
    pub grades: Vec<GradeRecord>,
    #[serde(default)]
    pub transactions: Vec<FeeTransaction>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RefreshReport {
    pub students_added: usize,
    pub students_updated: usize,
    pub assignments_added: usize,
    pub records_created: usize,
    pub transactions_added: usize,
    pub skipped_grades: usize,
    pub rejected: Vec<String>,
}

impl RefreshReport {
    pub fn is_noop(&self) -> bool {
        self.students_added == 0
            && self.students_updated == 0
            && self.assignments_added == 0
            && self.records_created == 0
            && self.transactions_added == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_input_accepts_numbers_and_numeric_text() {
        assert_eq!(ScoreInput::from(42.5).to_value().unwrap(), 42.5);
        assert_eq!(ScoreInput::from(" 85 ").to_value().unwrap(), 85.0);
    }

    #[test]
    fn score_input_rejects_non_numeric_text() {
        let err = ScoreInput::from("eighty").to_value().unwrap_err();
        assert_eq!(err, LifecycleError::NonNumericScore("eighty".to_string()));
        assert!(ScoreInput::from("").to_value().is_err());
        assert!(ScoreInput::from(f64::NAN).to_value().is_err());
        assert!(ScoreInput::from("inf").to_value().is_err());
    }

    #[test]
    fn score_input_deserializes_untagged() {
        let number: ScoreInput = serde_json::from_str("17").unwrap();
        assert_eq!(number, ScoreInput::Number(17.0));
        let text: ScoreInput = serde_json::from_str("\"17\"").unwrap();
        assert_eq!(text, ScoreInput::Text("17".to_string()));
    }
}
