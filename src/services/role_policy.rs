use crate::core::security::{Claims, PortalRole};

/// Operations exposed by the portal, grouped by who performs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PortalAction {
    EnrolStudent,
    CreateAssignment,
    EditScores,
    SubmitBatch,
    ReviewBatch,
    PublishBatch,
    ViewRecords,
    ViewResults,
    ViewFees,
    RecordFee,
    ToggleResults,
    RefreshRegistry,
    ExportSnapshot,
}

pub(crate) fn may_perform(role: PortalRole, action: PortalAction) -> bool {
    use PortalAction::*;
    use PortalRole::*;

    match action {
        CreateAssignment | EditScores | SubmitBatch => role == Teacher,
        ReviewBatch | PublishBatch => role == ExamsOffice,
        ViewRecords => matches!(role, Teacher | ExamsOffice | Executive),
        ViewResults => matches!(role, Parent | Pupil | Executive),
        ViewFees => matches!(role, Accounts | Executive | Parent),
        EnrolStudent | RecordFee | ToggleResults => matches!(role, Accounts | Executive),
        RefreshRegistry | ExportSnapshot => role == Executive,
    }
}

/// Family tokens only see the students they are linked to; staff roles are
/// limited by `may_perform` alone.
pub(crate) fn may_access_student(claims: &Claims, student_id: &str) -> bool {
    match claims.role {
        PortalRole::Parent | PortalRole::Pupil => {
            claims.student_ids.iter().any(|linked| linked == student_id)
        }
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: PortalRole, linked: &[&str]) -> Claims {
        Claims {
            sub: "actor".to_string(),
            role,
            student_ids: linked.iter().map(|id| id.to_string()).collect(),
            exp: 0,
        }
    }

    #[test]
    fn maker_and_checker_are_separate() {
        assert!(may_perform(PortalRole::Teacher, PortalAction::EditScores));
        assert!(may_perform(PortalRole::Teacher, PortalAction::SubmitBatch));
        assert!(!may_perform(PortalRole::Teacher, PortalAction::ReviewBatch));
        assert!(!may_perform(PortalRole::Teacher, PortalAction::PublishBatch));

        assert!(may_perform(PortalRole::ExamsOffice, PortalAction::ReviewBatch));
        assert!(may_perform(PortalRole::ExamsOffice, PortalAction::PublishBatch));
        assert!(!may_perform(PortalRole::ExamsOffice, PortalAction::EditScores));
        assert!(!may_perform(PortalRole::ExamsOffice, PortalAction::SubmitBatch));
    }

    #[test]
    fn ledger_belongs_to_accounts_and_executive() {
        for role in [PortalRole::Accounts, PortalRole::Executive] {
            assert!(may_perform(role, PortalAction::RecordFee));
            assert!(may_perform(role, PortalAction::ToggleResults));
        }
        for role in [PortalRole::Teacher, PortalRole::ExamsOffice, PortalRole::Parent] {
            assert!(!may_perform(role, PortalAction::ToggleResults));
        }
        assert!(may_perform(PortalRole::Parent, PortalAction::ViewFees));
        assert!(!may_perform(PortalRole::Pupil, PortalAction::ViewFees));
    }

    #[test]
    fn family_roles_only_read_results() {
        for role in [PortalRole::Parent, PortalRole::Pupil] {
            assert!(may_perform(role, PortalAction::ViewResults));
            assert!(!may_perform(role, PortalAction::ViewRecords));
            assert!(!may_perform(role, PortalAction::EditScores));
        }
        assert!(!may_perform(PortalRole::Teacher, PortalAction::ViewResults));
    }

    #[test]
    fn family_access_is_limited_to_linked_students() {
        let parent = claims(PortalRole::Parent, &["s-1"]);
        assert!(may_access_student(&parent, "s-1"));
        assert!(!may_access_student(&parent, "s-2"));

        let pupil = claims(PortalRole::Pupil, &[]);
        assert!(!may_access_student(&pupil, "s-1"));

        let executive = claims(PortalRole::Executive, &[]);
        assert!(may_access_student(&executive, "s-9"));
    }
}
