use std::collections::{BTreeMap, HashSet};

use super::roster::{validate_assignment, validate_student};
use super::{
    Assignment, GradeBatch, GradeEntry, GradeRecord, RefreshReport, Registry, RegistrySnapshot,
};

impl Registry {
    /// Merges externally originated changes from the shared store.
    ///
    /// Students are upserted, unseen assignments are adopted and unseen ledger
    /// entries appended. Batches this registry already holds are never
    /// rewritten; their snapshot records are counted in `skipped_grades`.
    pub fn apply_snapshot(&mut self, snapshot: RegistrySnapshot) -> RefreshReport {
        let mut report = RefreshReport::default();

        for student in snapshot.students {
            if self.students.get(&student.id) == Some(&student) {
                continue;
            }
            let student_id = student.id.clone();
            match self.upsert_student(student) {
                Ok(upsert) => {
                    if upsert.created {
                        report.students_added += 1;
                    } else {
                        report.students_updated += 1;
                    }
                    report.records_created += upsert.records_created;
                }
                Err(err) => report.rejected.push(format!("student {student_id}: {err}")),
            }
        }

        let mut grades_by_assignment: BTreeMap<String, Vec<GradeRecord>> = BTreeMap::new();
        for grade in snapshot.grades {
            grades_by_assignment.entry(grade.assignment_id.clone()).or_default().push(grade);
        }

        for assignment in snapshot.assignments {
            let grades = grades_by_assignment.remove(&assignment.id).unwrap_or_default();

            if self.assignments.contains_key(&assignment.id) {
                report.skipped_grades += grades.len();
                continue;
            }

            let assignment_id = assignment.id.clone();
            match self.adopt_assignment(assignment, grades) {
                Ok(created) => {
                    report.assignments_added += 1;
                    report.records_created += created;
                }
                Err(reason) => {
                    report.rejected.push(format!("assignment {assignment_id}: {reason}"))
                }
            }
        }

        for (assignment_id, grades) in grades_by_assignment {
            if self.assignments.contains_key(&assignment_id) {
                report.skipped_grades += grades.len();
            } else {
                report.rejected.push(format!(
                    "{} grade records reference unknown assignment {assignment_id}",
                    grades.len()
                ));
            }
        }

        for transaction in snapshot.transactions {
            if self.transaction_ids.contains(&transaction.id) {
                continue;
            }
            let transaction_id = transaction.id.clone();
            match self.append_transaction(transaction) {
                Ok(_) => report.transactions_added += 1,
                Err(err) => report.rejected.push(format!("transaction {transaction_id}: {err}")),
            }
        }

        report
    }

    /// Full copy of the registry in the wire shape of the shared store.
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            students: self.students.values().cloned().collect(),
            assignments: self.assignments.values().cloned().collect(),
            grades: self
                .batches
                .iter()
                .flat_map(|(assignment_id, batch)| batch.records(assignment_id))
                .collect(),
            transactions: self.ledger.clone(),
        }
    }

    /// Adopts an assignment first seen in a snapshot. Returns the number of
    /// records that had to be opened locally.
    fn adopt_assignment(
        &mut self,
        assignment: Assignment,
        grades: Vec<GradeRecord>,
    ) -> Result<usize, String> {
        validate_assignment(&assignment).map_err(|err| err.to_string())?;

        let Some(status) = grades.first().map(|grade| grade.status) else {
            let mut batch = GradeBatch::draft();
            batch.entries = self
                .roster(&assignment.class_id)
                .into_iter()
                .map(|student| GradeEntry::fresh(&student.id))
                .collect();
            let created = batch.entries.len();
            self.insert_batch(assignment, batch);
            return Ok(created);
        };

        let mut batch = GradeBatch { status, entries: Vec::with_capacity(grades.len()) };
        let mut seen_students = HashSet::new();
        let mut seen_ids = HashSet::new();

        for grade in grades {
            if grade.status != status {
                return Err(format!(
                    "mixed statuses {} and {} in one batch",
                    status.as_str(),
                    grade.status.as_str()
                ));
            }
            if !self.students.contains_key(&grade.student_id) {
                return Err(format!("record {} references unknown student", grade.id));
            }
            if !grade.score.is_finite()
                || grade.score < 0.0
                || grade.score > f64::from(assignment.max_score)
            {
                return Err(format!("record {} has score {} out of range", grade.id, grade.score));
            }
            if grade.id.trim().is_empty()
                || self.grade_index.contains_key(&grade.id)
                || !seen_ids.insert(grade.id.clone())
            {
                return Err(format!("record id '{}' is empty or already in use", grade.id));
            }
            if !seen_students.insert(grade.student_id.clone()) {
                return Err(format!("student {} has more than one record", grade.student_id));
            }

            batch.entries.push(GradeEntry {
                id: grade.id,
                student_id: grade.student_id,
                score: grade.score,
                remark: grade.remark,
            });
        }

        let missing: Vec<String> = self
            .roster(&assignment.class_id)
            .into_iter()
            .filter(|student| !seen_students.contains(&student.id))
            .map(|student| student.id.clone())
            .collect();

        let mut created = 0;
        if !missing.is_empty() {
            if !status.is_editable() {
                return Err(format!(
                    "{} batch is missing records for {}",
                    status.as_str(),
                    missing.join(", ")
                ));
            }
            for student_id in &missing {
                batch.entries.push(GradeEntry::fresh(student_id));
                created += 1;
            }
        }

        self.insert_batch(assignment, batch);
        Ok(created)
    }
}
