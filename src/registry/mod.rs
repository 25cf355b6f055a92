//! In-memory system of record for students, assignments, grade batches and the
//! fee ledger.
//!
//! Every assignment owns exactly one grade batch. The batch carries the single
//! workflow status shared by all of its records, so a partially transitioned
//! assignment cannot be represented. All operations are synchronous; callers that
//! share a registry across tasks wrap it in a lock and hold the write half for the
//! duration of one call.

mod error;
mod fees;
mod grades;
mod models;
mod refresh;
mod roster;
mod types;

use std::collections::{BTreeMap, HashMap, HashSet};

pub use error::LifecycleError;
pub use models::{
    Assignment, AssignmentSummary, FeeTransaction, GradeRecord, NewAssignment, NewTransaction,
    RefreshReport, RegistrySnapshot, ScoreInput, StatusChange, Student,
};
pub use fees::MAX_TRANSACTION_AMOUNT;
pub use roster::StudentUpsert;
pub use types::{AssignmentKind, BatchAction, GradeStatus, ReviewDecision, TransactionKind};

#[derive(Debug, Clone, Default)]
pub struct Registry {
    students: BTreeMap<String, Student>,
    assignments: BTreeMap<String, Assignment>,
    batches: BTreeMap<String, GradeBatch>,
    grade_index: HashMap<String, String>,
    ledger: Vec<FeeTransaction>,
    transaction_ids: HashSet<String>,
}

#[derive(Debug, Clone)]
struct GradeBatch {
    status: GradeStatus,
    entries: Vec<GradeEntry>,
}

#[derive(Debug, Clone)]
struct GradeEntry {
    id: String,
    student_id: String,
    score: f64,
    remark: Option<String>,
}

impl GradeBatch {
    fn draft() -> Self {
        Self { status: GradeStatus::Draft, entries: Vec::new() }
    }

    fn record(&self, assignment_id: &str, entry: &GradeEntry) -> GradeRecord {
        GradeRecord {
            id: entry.id.clone(),
            assignment_id: assignment_id.to_string(),
            student_id: entry.student_id.clone(),
            score: entry.score,
            status: self.status,
            remark: entry.remark.clone(),
        }
    }

    fn records(&self, assignment_id: &str) -> Vec<GradeRecord> {
        self.entries.iter().map(|entry| self.record(assignment_id, entry)).collect()
    }

    fn has_student(&self, student_id: &str) -> bool {
        self.entries.iter().any(|entry| entry.student_id == student_id)
    }
}

impl GradeEntry {
    fn fresh(student_id: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            student_id: student_id.to_string(),
            score: 0.0,
            remark: None,
        }
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry seeded from a snapshot of the shared store.
    pub fn from_snapshot(snapshot: RegistrySnapshot) -> (Self, RefreshReport) {
        let mut registry = Self::new();
        let report = registry.apply_snapshot(snapshot);
        (registry, report)
    }

    pub fn student(&self, student_id: &str) -> Option<&Student> {
        self.students.get(student_id)
    }

    pub fn students(&self) -> impl Iterator<Item = &Student> {
        self.students.values()
    }

    pub fn assignment(&self, assignment_id: &str) -> Option<&Assignment> {
        self.assignments.get(assignment_id)
    }

    pub fn assignments(&self) -> impl Iterator<Item = &Assignment> {
        self.assignments.values()
    }

    pub fn assignment_status(&self, assignment_id: &str) -> Option<GradeStatus> {
        self.batches.get(assignment_id).map(|batch| batch.status)
    }

    /// Students currently enrolled in `class_id`, ordered by id.
    pub fn roster(&self, class_id: &str) -> Vec<&Student> {
        self.students.values().filter(|student| student.class_id == class_id).collect()
    }

    pub fn student_count(&self) -> usize {
        self.students.len()
    }

    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }

    fn insert_batch(&mut self, assignment: Assignment, batch: GradeBatch) {
        for entry in &batch.entries {
            self.grade_index.insert(entry.id.clone(), assignment.id.clone());
        }
        self.batches.insert(assignment.id.clone(), batch);
        self.assignments.insert(assignment.id.clone(), assignment);
    }
}
