use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GradeStatus {
    Draft,
    Submitted,
    Approved,
    Published,
}

impl GradeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GradeStatus::Draft => "DRAFT",
            GradeStatus::Submitted => "SUBMITTED",
            GradeStatus::Approved => "APPROVED",
            GradeStatus::Published => "PUBLISHED",
        }
    }

    /// Scores and remarks may only be written while the batch is a draft.
    pub fn is_editable(self) -> bool {
        matches!(self, GradeStatus::Draft)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, GradeStatus::Published)
    }

    /// The status reached by applying `action`, or `None` when the
    /// transition table has no such edge.
    pub fn apply(self, action: BatchAction) -> Option<GradeStatus> {
        match (self, action) {
            (GradeStatus::Draft, BatchAction::Submit) => Some(GradeStatus::Submitted),
            (GradeStatus::Submitted, BatchAction::Approve) => Some(GradeStatus::Approved),
            (GradeStatus::Submitted, BatchAction::Reject) => Some(GradeStatus::Draft),
            (GradeStatus::Approved, BatchAction::Publish) => Some(GradeStatus::Published),
            _ => None,
        }
    }
}

impl fmt::Display for GradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A whole-batch step of the maker-checker workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchAction {
    Submit,
    Approve,
    Reject,
    Publish,
}

impl BatchAction {
    pub fn as_str(self) -> &'static str {
        match self {
            BatchAction::Submit => "submit",
            BatchAction::Approve => "approve",
            BatchAction::Reject => "reject",
            BatchAction::Publish => "publish",
        }
    }
}

impl fmt::Display for BatchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

impl From<ReviewDecision> for BatchAction {
    fn from(decision: ReviewDecision) -> Self {
        match decision {
            ReviewDecision::Approve => BatchAction::Approve,
            ReviewDecision::Reject => BatchAction::Reject,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentKind {
    Test,
    Exam,
    Homework,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    Bill,
    Payment,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_table_matches_workflow() {
        use BatchAction::*;
        use GradeStatus::*;

        assert_eq!(Draft.apply(Submit), Some(Submitted));
        assert_eq!(Submitted.apply(Approve), Some(Approved));
        assert_eq!(Submitted.apply(Reject), Some(Draft));
        assert_eq!(Approved.apply(Publish), Some(Published));

        assert_eq!(Draft.apply(Approve), None);
        assert_eq!(Draft.apply(Publish), None);
        assert_eq!(Submitted.apply(Submit), None);
        assert_eq!(Submitted.apply(Publish), None);
        assert_eq!(Approved.apply(Reject), None);
        assert_eq!(Approved.apply(Submit), None);
        for action in [Submit, Approve, Reject, Publish] {
            assert_eq!(Published.apply(action), None);
        }
    }

    #[test]
    fn only_draft_is_editable() {
        assert!(GradeStatus::Draft.is_editable());
        assert!(!GradeStatus::Submitted.is_editable());
        assert!(!GradeStatus::Approved.is_editable());
        assert!(!GradeStatus::Published.is_editable());
    }

    #[test]
    fn status_serializes_uppercase() {
        let value = serde_json::to_value(GradeStatus::Submitted).unwrap();
        assert_eq!(value, serde_json::json!("SUBMITTED"));
        let kind: TransactionKind = serde_json::from_str("\"PAYMENT\"").unwrap();
        assert_eq!(kind, TransactionKind::Payment);
    }
}
