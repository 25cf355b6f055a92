use serde::Serialize;

use super::{Assignment, GradeBatch, GradeEntry, LifecycleError, NewAssignment, Registry, Student};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StudentUpsert {
    pub created: bool,
    /// Draft records opened for the student in their class's editable batches.
    pub records_created: usize,
}

impl Registry {
    /// Adds or replaces a student. Last write wins, including the
    /// `results_unlocked` flag.
    ///
    /// A class change drops the student's records from the old class's DRAFT
    /// batches. Records in batches already submitted stay where they are.
    pub fn upsert_student(&mut self, student: Student) -> Result<StudentUpsert, LifecycleError> {
        validate_student(&student)?;

        let previous = self.students.insert(student.id.clone(), student.clone());
        let created = previous.is_none();
        if let Some(previous) = previous.filter(|previous| previous.class_id != student.class_id) {
            self.leave_draft_batches(&previous.class_id);
        }
        let records_created = self.enroll_in_draft_batches(&student);

        if created {
            tracing::debug!(
                student_id = %student.id,
                class_id = %student.class_id,
                records_created,
                "Student enrolled"
            );
        }

        Ok(StudentUpsert { created, records_created })
    }

    /// Creates an assignment together with one DRAFT record (score 0) for
    /// every student on the class roster.
    pub fn create_assignment(
        &mut self,
        new_assignment: NewAssignment,
    ) -> Result<Assignment, LifecycleError> {
        let assignment = Assignment {
            id: new_assignment
                .id
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            class_id: new_assignment.class_id.trim().to_string(),
            title: new_assignment.title.trim().to_string(),
            max_score: new_assignment.max_score,
            kind: new_assignment.kind,
            date: new_assignment.date,
        };
        validate_assignment(&assignment)?;

        if self.assignments.contains_key(&assignment.id) {
            return Err(LifecycleError::DuplicateAssignment(assignment.id));
        }

        let mut batch = GradeBatch::draft();
        batch.entries = self
            .roster(&assignment.class_id)
            .into_iter()
            .map(|student| GradeEntry::fresh(&student.id))
            .collect();

        tracing::info!(
            assignment_id = %assignment.id,
            class_id = %assignment.class_id,
            records = batch.entries.len(),
            "Assignment created"
        );

        self.insert_batch(assignment.clone(), batch);
        Ok(assignment)
    }

    fn leave_draft_batches(&mut self, class_id: &str) -> usize {
        let draft_ids: Vec<String> = self
            .assignments
            .values()
            .filter(|assignment| assignment.class_id == class_id)
            .filter(|assignment| {
                self.batches.get(&assignment.id).is_some_and(|batch| batch.status.is_editable())
            })
            .map(|assignment| assignment.id.clone())
            .collect();

        draft_ids
            .iter()
            .map(|assignment_id| self.drop_off_roster_records(assignment_id, class_id))
            .sum()
    }

    /// Opens records for `student` in every DRAFT batch of their class that
    /// does not have one yet. Batches past DRAFT are left as they are.
    fn enroll_in_draft_batches(&mut self, student: &Student) -> usize {
        let mut created = 0;

        for (assignment_id, assignment) in &self.assignments {
            if assignment.class_id != student.class_id {
                continue;
            }
            let Some(batch) = self.batches.get_mut(assignment_id) else {
                continue;
            };
            if !batch.status.is_editable() || batch.has_student(&student.id) {
                continue;
            }

            let entry = GradeEntry::fresh(&student.id);
            self.grade_index.insert(entry.id.clone(), assignment_id.clone());
            batch.entries.push(entry);
            created += 1;
        }

        created
    }
}

pub(super) fn validate_student(student: &Student) -> Result<(), LifecycleError> {
    if student.id.trim().is_empty() {
        return Err(LifecycleError::InvalidStudent("id must not be empty".to_string()));
    }
    if student.full_name.trim().is_empty() {
        return Err(LifecycleError::InvalidStudent(format!(
            "student {} has an empty name",
            student.id
        )));
    }
    if student.class_id.trim().is_empty() {
        return Err(LifecycleError::InvalidStudent(format!(
            "student {} has no class",
            student.id
        )));
    }
    Ok(())
}

pub(super) fn validate_assignment(assignment: &Assignment) -> Result<(), LifecycleError> {
    if assignment.id.trim().is_empty() {
        return Err(LifecycleError::InvalidAssignment("id must not be empty".to_string()));
    }
    if assignment.title.trim().is_empty() {
        return Err(LifecycleError::InvalidAssignment("title must not be empty".to_string()));
    }
    if assignment.class_id.trim().is_empty() {
        return Err(LifecycleError::InvalidAssignment("class_id must not be empty".to_string()));
    }
    if assignment.max_score == 0 {
        return Err(LifecycleError::InvalidAssignment("max_score must be positive".to_string()));
    }
    Ok(())
}
