use super::{
    AssignmentSummary, BatchAction, GradeEntry, GradeRecord, LifecycleError, Registry,
    ReviewDecision, ScoreInput, StatusChange,
};

impl Registry {
    /// Stores a teacher-entered score. Only DRAFT records accept writes and the
    /// value must lie within `0..=max_score` of the assignment.
    pub fn set_score(
        &mut self,
        grade_id: &str,
        input: impl Into<ScoreInput>,
    ) -> Result<GradeRecord, LifecycleError> {
        let assignment_id = self.assignment_for_grade(grade_id)?;
        let max_score = self
            .assignments
            .get(&assignment_id)
            .map(|assignment| assignment.max_score)
            .ok_or_else(|| LifecycleError::AssignmentNotFound(assignment_id.clone()))?;
        let batch = self
            .batches
            .get_mut(&assignment_id)
            .ok_or_else(|| LifecycleError::AssignmentNotFound(assignment_id.clone()))?;

        if !batch.status.is_editable() {
            return Err(LifecycleError::RecordLocked {
                grade_id: grade_id.to_string(),
                status: batch.status,
            });
        }

        let score = input.into().to_value()?;
        if score < 0.0 || score > f64::from(max_score) {
            return Err(LifecycleError::ScoreOutOfRange { score, max_score });
        }

        let entry = batch
            .entries
            .iter_mut()
            .find(|entry| entry.id == grade_id)
            .ok_or_else(|| LifecycleError::GradeNotFound(grade_id.to_string()))?;
        entry.score = score;

        let entry = entry.clone();
        Ok(batch.record(&assignment_id, &entry))
    }

    /// Sets or clears the remark on a DRAFT record. A blank remark clears it.
    pub fn set_remark(
        &mut self,
        grade_id: &str,
        remark: Option<&str>,
    ) -> Result<GradeRecord, LifecycleError> {
        let assignment_id = self.assignment_for_grade(grade_id)?;
        let batch = self
            .batches
            .get_mut(&assignment_id)
            .ok_or_else(|| LifecycleError::AssignmentNotFound(assignment_id.clone()))?;

        if !batch.status.is_editable() {
            return Err(LifecycleError::RecordLocked {
                grade_id: grade_id.to_string(),
                status: batch.status,
            });
        }

        let entry = batch
            .entries
            .iter_mut()
            .find(|entry| entry.id == grade_id)
            .ok_or_else(|| LifecycleError::GradeNotFound(grade_id.to_string()))?;
        entry.remark =
            remark.map(str::trim).filter(|value| !value.is_empty()).map(ToString::to_string);

        let entry = entry.clone();
        Ok(batch.record(&assignment_id, &entry))
    }

    /// Teacher hands the whole batch to the exams office.
    pub fn submit_assignment(
        &mut self,
        assignment_id: &str,
    ) -> Result<StatusChange, LifecycleError> {
        self.transition(assignment_id, BatchAction::Submit)
    }

    /// Exams office accepts (SUBMITTED → APPROVED) or sends the batch back to
    /// the teacher (SUBMITTED → DRAFT).
    pub fn review_assignment(
        &mut self,
        assignment_id: &str,
        decision: ReviewDecision,
    ) -> Result<StatusChange, LifecycleError> {
        self.transition(assignment_id, decision.into())
    }

    /// Exams office releases an approved batch to the parent/pupil read path.
    pub fn publish_assignment(
        &mut self,
        assignment_id: &str,
    ) -> Result<StatusChange, LifecycleError> {
        self.transition(assignment_id, BatchAction::Publish)
    }

    pub fn transition(
        &mut self,
        assignment_id: &str,
        action: BatchAction,
    ) -> Result<StatusChange, LifecycleError> {
        let class_id = self
            .assignments
            .get(assignment_id)
            .map(|assignment| assignment.class_id.clone())
            .ok_or_else(|| LifecycleError::AssignmentNotFound(assignment_id.to_string()))?;
        let batch = self
            .batches
            .get(assignment_id)
            .ok_or_else(|| LifecycleError::AssignmentNotFound(assignment_id.to_string()))?;

        let from = batch.status;
        let Some(to) = from.apply(action) else {
            return Err(LifecycleError::IllegalTransition {
                assignment_id: assignment_id.to_string(),
                action,
                status: from,
            });
        };

        if action == BatchAction::Submit {
            let missing: Vec<String> = self
                .students
                .values()
                .filter(|student| student.class_id == class_id && !batch.has_student(&student.id))
                .map(|student| student.id.clone())
                .collect();
            if !missing.is_empty() {
                return Err(LifecycleError::IncompleteBatch {
                    assignment_id: assignment_id.to_string(),
                    missing,
                });
            }
        }

        if let Some(batch) = self.batches.get_mut(assignment_id) {
            batch.status = to;
        }
        if to.is_editable() {
            self.drop_off_roster_records(assignment_id, &class_id);
            self.open_missing_records(assignment_id, &class_id);
        }
        let records = self.batches.get(assignment_id).map_or(0, |batch| batch.entries.len());

        tracing::info!(
            assignment_id,
            action = action.as_str(),
            from = from.as_str(),
            to = to.as_str(),
            records,
            "Grade batch transitioned"
        );

        Ok(StatusChange { assignment_id: assignment_id.to_string(), action, from, to, records })
    }

    pub fn record(&self, grade_id: &str) -> Option<GradeRecord> {
        let assignment_id = self.grade_index.get(grade_id)?;
        let batch = self.batches.get(assignment_id)?;
        let entry = batch.entries.iter().find(|entry| entry.id == grade_id)?;
        Some(batch.record(assignment_id, entry))
    }

    /// Copies of every record of one assignment; empty for unknown ids.
    pub fn records_by_assignment(&self, assignment_id: &str) -> Vec<GradeRecord> {
        self.batches
            .get(assignment_id)
            .map(|batch| batch.records(assignment_id))
            .unwrap_or_default()
    }

    /// Copies of every record held for one student, ordered by assignment id.
    pub fn records_by_student(&self, student_id: &str) -> Vec<GradeRecord> {
        self.batches
            .iter()
            .flat_map(|(assignment_id, batch)| {
                batch
                    .entries
                    .iter()
                    .filter(|entry| entry.student_id == student_id)
                    .map(move |entry| batch.record(assignment_id, entry))
            })
            .collect()
    }

    pub fn assignment_summary(
        &self,
        assignment_id: &str,
    ) -> Result<AssignmentSummary, LifecycleError> {
        let assignment = self
            .assignments
            .get(assignment_id)
            .ok_or_else(|| LifecycleError::AssignmentNotFound(assignment_id.to_string()))?;
        let batch = self
            .batches
            .get(assignment_id)
            .ok_or_else(|| LifecycleError::AssignmentNotFound(assignment_id.to_string()))?;

        let scores: Vec<f64> = batch.entries.iter().map(|entry| entry.score).collect();
        let mean_score = if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        };

        Ok(AssignmentSummary {
            assignment_id: assignment.id.clone(),
            title: assignment.title.clone(),
            status: batch.status,
            max_score: assignment.max_score,
            records: scores.len(),
            mean_score,
            highest_score: scores.iter().copied().reduce(f64::max),
            lowest_score: scores.iter().copied().reduce(f64::min),
        })
    }

    /// Gives every roster student without a record a fresh DRAFT one.
    fn open_missing_records(&mut self, assignment_id: &str, class_id: &str) -> usize {
        let Some(batch) = self.batches.get_mut(assignment_id) else {
            return 0;
        };

        let mut opened = 0;
        for student in self.students.values().filter(|student| student.class_id == class_id) {
            if batch.has_student(&student.id) {
                continue;
            }
            let entry = GradeEntry::fresh(&student.id);
            self.grade_index.insert(entry.id.clone(), assignment_id.to_string());
            batch.entries.push(entry);
            opened += 1;
        }

        if opened > 0 {
            tracing::info!(assignment_id, opened, "Opened records for newly enrolled students");
        }
        opened
    }

    /// Removes records of students who have since moved to another class.
    /// Only called for DRAFT batches.
    pub(super) fn drop_off_roster_records(&mut self, assignment_id: &str, class_id: &str) -> usize {
        let Some(batch) = self.batches.get_mut(assignment_id) else {
            return 0;
        };

        let students = &self.students;
        let grade_index = &mut self.grade_index;
        let before = batch.entries.len();
        batch.entries.retain(|entry| {
            let on_roster = students
                .get(&entry.student_id)
                .is_some_and(|student| student.class_id == class_id);
            if !on_roster {
                grade_index.remove(&entry.id);
            }
            on_roster
        });

        let dropped = before - batch.entries.len();
        if dropped > 0 {
            tracing::info!(
                assignment_id,
                dropped,
                "Dropped records of students who left the class"
            );
        }
        dropped
    }

    fn assignment_for_grade(&self, grade_id: &str) -> Result<String, LifecycleError> {
        self.grade_index
            .get(grade_id)
            .cloned()
            .ok_or_else(|| LifecycleError::GradeNotFound(grade_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::registry::{
        AssignmentKind, BatchAction, GradeRecord, GradeStatus, LifecycleError, NewAssignment,
        Registry, ReviewDecision, Student,
    };

    fn registry_with_batch(max_score: u32) -> Registry {
        let mut registry = Registry::new();
        for id in ["s1", "s2"] {
            registry
                .upsert_student(Student {
                    id: id.to_string(),
                    full_name: format!("Pupil {id}"),
                    class_id: "jss1".to_string(),
                    results_unlocked: false,
                })
                .unwrap();
        }
        registry
            .create_assignment(NewAssignment {
                id: Some("a1".to_string()),
                class_id: "jss1".to_string(),
                title: "Algebra test".to_string(),
                max_score,
                kind: AssignmentKind::Test,
                date: date!(2025 - 02 - 03),
            })
            .unwrap();
        registry
    }

    fn grade_id(registry: &Registry, student_id: &str) -> String {
        registry
            .records_by_assignment("a1")
            .into_iter()
            .find(|record| record.student_id == student_id)
            .map(|record| record.id)
            .unwrap()
    }

    fn assert_uniform(records: &[GradeRecord], status: GradeStatus) {
        assert!(records.iter().all(|record| record.status == status), "{records:?}");
    }

    #[test]
    fn set_score_stores_values_within_range() {
        let mut registry = registry_with_batch(100);
        let id = grade_id(&registry, "s1");

        let record = registry.set_score(&id, 0.0).unwrap();
        assert_eq!(record.score, 0.0);
        let record = registry.set_score(&id, 100.0).unwrap();
        assert_eq!(record.score, 100.0);
        let record = registry.set_score(&id, "72.5").unwrap();
        assert_eq!(record.score, 72.5);
        assert_eq!(registry.record(&id).unwrap().score, 72.5);
    }

    #[test]
    fn set_score_rejects_invalid_values_without_change() {
        let mut registry = registry_with_batch(100);
        let id = grade_id(&registry, "s1");
        registry.set_score(&id, 60.0).unwrap();

        assert!(matches!(
            registry.set_score(&id, 100.5),
            Err(LifecycleError::ScoreOutOfRange { max_score: 100, .. })
        ));
        assert!(matches!(
            registry.set_score(&id, -1.0),
            Err(LifecycleError::ScoreOutOfRange { .. })
        ));
        assert!(matches!(
            registry.set_score(&id, "abc"),
            Err(LifecycleError::NonNumericScore(_))
        ));

        assert_eq!(registry.record(&id).unwrap().score, 60.0);
    }

    #[test]
    fn set_score_unknown_grade_is_not_found() {
        let mut registry = registry_with_batch(100);
        let err = registry.set_score("missing", 10.0).unwrap_err();
        assert_eq!(err, LifecycleError::GradeNotFound("missing".to_string()));
    }

    #[test]
    fn set_score_refused_outside_draft() {
        let mut registry = registry_with_batch(100);
        let id = grade_id(&registry, "s1");
        registry.set_score(&id, 50.0).unwrap();
        registry.submit_assignment("a1").unwrap();

        let err = registry.set_score(&id, 90.0).unwrap_err();
        assert_eq!(
            err,
            LifecycleError::RecordLocked { grade_id: id.clone(), status: GradeStatus::Submitted }
        );
        assert_eq!(registry.record(&id).unwrap().score, 50.0);
    }

    #[test]
    fn submit_twice_keeps_submitted() {
        let mut registry = registry_with_batch(100);
        let change = registry.submit_assignment("a1").unwrap();
        assert_eq!(change.from, GradeStatus::Draft);
        assert_eq!(change.to, GradeStatus::Submitted);
        assert_eq!(change.records, 2);

        let err = registry.submit_assignment("a1").unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::IllegalTransition { status: GradeStatus::Submitted, .. }
        ));
        assert_eq!(registry.assignment_status("a1"), Some(GradeStatus::Submitted));
        assert_uniform(&registry.records_by_assignment("a1"), GradeStatus::Submitted);
    }

    #[test]
    fn reject_reopens_editing() {
        let mut registry = registry_with_batch(100);
        let id = grade_id(&registry, "s2");
        registry.submit_assignment("a1").unwrap();
        registry.review_assignment("a1", ReviewDecision::Reject).unwrap();

        assert_uniform(&registry.records_by_assignment("a1"), GradeStatus::Draft);
        assert_eq!(registry.set_score(&id, 12.0).unwrap().score, 12.0);
    }

    #[test]
    fn review_and_publish_require_the_right_status() {
        let mut registry = registry_with_batch(100);

        assert!(registry.review_assignment("a1", ReviewDecision::Approve).is_err());
        assert!(registry.publish_assignment("a1").is_err());
        assert_eq!(registry.assignment_status("a1"), Some(GradeStatus::Draft));

        registry.submit_assignment("a1").unwrap();
        assert!(registry.publish_assignment("a1").is_err());
        registry.review_assignment("a1", ReviewDecision::Approve).unwrap();
        assert!(registry.review_assignment("a1", ReviewDecision::Reject).is_err());
        registry.publish_assignment("a1").unwrap();

        assert_uniform(&registry.records_by_assignment("a1"), GradeStatus::Published);
        for action in [BatchAction::Submit, BatchAction::Approve, BatchAction::Publish] {
            assert!(registry.transition("a1", action).is_err());
        }
    }

    #[test]
    fn transitions_on_unknown_assignment_are_not_found() {
        let mut registry = registry_with_batch(100);
        assert_eq!(
            registry.submit_assignment("nope").unwrap_err(),
            LifecycleError::AssignmentNotFound("nope".to_string())
        );
        assert!(registry.records_by_assignment("nope").is_empty());
    }

    #[test]
    fn remark_follows_draft_rule() {
        let mut registry = registry_with_batch(100);
        let id = grade_id(&registry, "s1");

        let record = registry.set_remark(&id, Some("  Good effort ")).unwrap();
        assert_eq!(record.remark.as_deref(), Some("Good effort"));
        let record = registry.set_remark(&id, Some("   ")).unwrap();
        assert_eq!(record.remark, None);

        registry.submit_assignment("a1").unwrap();
        assert!(matches!(
            registry.set_remark(&id, Some("late")),
            Err(LifecycleError::RecordLocked { .. })
        ));
    }

    #[test]
    fn returned_records_are_copies() {
        let mut registry = registry_with_batch(100);
        let id = grade_id(&registry, "s1");
        registry.set_score(&id, 40.0).unwrap();

        let mut records = registry.records_by_student("s1");
        records[0].score = 99.0;
        records[0].status = GradeStatus::Published;

        let stored = registry.record(&id).unwrap();
        assert_eq!(stored.score, 40.0);
        assert_eq!(stored.status, GradeStatus::Draft);
    }

    #[test]
    fn summary_reports_batch_statistics() {
        let mut registry = registry_with_batch(50);
        let first = grade_id(&registry, "s1");
        let second = grade_id(&registry, "s2");
        registry.set_score(&first, 40.0).unwrap();
        registry.set_score(&second, 20.0).unwrap();

        let summary = registry.assignment_summary("a1").unwrap();
        assert_eq!(summary.records, 2);
        assert_eq!(summary.status, GradeStatus::Draft);
        assert_eq!(summary.mean_score, Some(30.0));
        assert_eq!(summary.highest_score, Some(40.0));
        assert_eq!(summary.lowest_score, Some(20.0));
    }

    #[test]
    fn submit_requires_record_for_every_roster_student() {
        let mut registry = registry_with_batch(100);
        registry.students.insert(
            "s3".to_string(),
            Student {
                id: "s3".to_string(),
                full_name: "Pupil s3".to_string(),
                class_id: "jss1".to_string(),
                results_unlocked: false,
            },
        );

        let err = registry.submit_assignment("a1").unwrap_err();
        assert_eq!(
            err,
            LifecycleError::IncompleteBatch {
                assignment_id: "a1".to_string(),
                missing: vec!["s3".to_string()],
            }
        );
        assert_eq!(registry.assignment_status("a1"), Some(GradeStatus::Draft));
    }

    #[test]
    fn reject_opens_records_for_pupils_enrolled_during_review() {
        let mut registry = registry_with_batch(100);
        registry.submit_assignment("a1").unwrap();
        registry
            .upsert_student(Student {
                id: "s3".to_string(),
                full_name: "Pupil s3".to_string(),
                class_id: "jss1".to_string(),
                results_unlocked: false,
            })
            .unwrap();
        assert_eq!(registry.records_by_assignment("a1").len(), 2);

        registry.review_assignment("a1", ReviewDecision::Reject).unwrap();
        let records = registry.records_by_assignment("a1");
        assert_eq!(records.len(), 3);
        assert_uniform(&records, GradeStatus::Draft);
        registry.submit_assignment("a1").unwrap();
    }
}
