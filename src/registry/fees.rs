use super::{
    FeeTransaction, GradeRecord, GradeStatus, LifecycleError, NewTransaction, Registry,
    TransactionKind,
};

/// Largest single bill or payment accepted, in major currency units.
pub const MAX_TRANSACTION_AMOUNT: f64 = 1_000_000_000.0;

// Slack for binary rounding when checking that an amount is a whole number of cents.
const CENT_TOLERANCE: f64 = 1e-4;

impl Registry {
    pub fn record_transaction(
        &mut self,
        transaction: NewTransaction,
    ) -> Result<FeeTransaction, LifecycleError> {
        let transaction = FeeTransaction {
            id: transaction
                .id
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            student_id: transaction.student_id,
            kind: transaction.kind,
            amount: transaction.amount,
            description: transaction.description.trim().to_string(),
            date: transaction.date,
        };
        self.append_transaction(transaction)
    }

    pub fn transactions_for(&self, student_id: &str) -> Vec<FeeTransaction> {
        self.ledger.iter().filter(|entry| entry.student_id == student_id).cloned().collect()
    }

    /// Sum of bills minus sum of payments. Positive means the family owes money.
    pub fn fee_balance(&self, student_id: &str) -> f64 {
        balance_minor_units(&self.ledger, student_id) as f64 / 100.0
    }

    /// Set by the accounts office once a payment has been verified by hand.
    pub fn set_results_unlocked(
        &mut self,
        student_id: &str,
        unlocked: bool,
    ) -> Result<(), LifecycleError> {
        let student = self
            .students
            .get_mut(student_id)
            .ok_or_else(|| LifecycleError::StudentNotFound(student_id.to_string()))?;
        student.results_unlocked = unlocked;

        tracing::info!(student_id, unlocked, "Results lock changed");
        Ok(())
    }

    /// Whether a parent or pupil may read this student's results right now.
    /// Both the ledger and the unlock flag are read on every call.
    pub fn results_visible(&self, student_id: &str) -> bool {
        let Some(student) = self.students.get(student_id) else {
            return false;
        };
        student.results_unlocked && balance_minor_units(&self.ledger, student_id) <= 0
    }

    /// Published records for the parent/pupil read path.
    pub fn published_results(&self, student_id: &str) -> Result<Vec<GradeRecord>, LifecycleError> {
        if !self.students.contains_key(student_id) {
            return Err(LifecycleError::StudentNotFound(student_id.to_string()));
        }
        if !self.results_visible(student_id) {
            return Err(LifecycleError::ResultsLocked(student_id.to_string()));
        }

        Ok(self
            .records_by_student(student_id)
            .into_iter()
            .filter(|record| record.status == GradeStatus::Published)
            .collect())
    }

    pub(super) fn append_transaction(
        &mut self,
        transaction: FeeTransaction,
    ) -> Result<FeeTransaction, LifecycleError> {
        if !self.students.contains_key(&transaction.student_id) {
            return Err(LifecycleError::StudentNotFound(transaction.student_id));
        }
        if minor_units(transaction.amount).is_none() {
            return Err(LifecycleError::InvalidTransaction(format!(
                "amount must be a positive whole number of cents up to {MAX_TRANSACTION_AMOUNT}, \
                 got {}",
                transaction.amount
            )));
        }
        if self.transaction_ids.contains(&transaction.id) {
            return Err(LifecycleError::InvalidTransaction(format!(
                "transaction {} already recorded",
                transaction.id
            )));
        }

        tracing::debug!(
            transaction_id = %transaction.id,
            student_id = %transaction.student_id,
            kind = ?transaction.kind,
            amount = transaction.amount,
            "Fee transaction recorded"
        );

        self.transaction_ids.insert(transaction.id.clone());
        self.ledger.push(transaction.clone());
        Ok(transaction)
    }
}

/// Converts a ledger amount to cents. `None` for anything that is not a
/// positive, whole number of cents within [`MAX_TRANSACTION_AMOUNT`].
fn minor_units(amount: f64) -> Option<i64> {
    if !amount.is_finite() || amount <= 0.0 || amount > MAX_TRANSACTION_AMOUNT {
        return None;
    }
    let scaled = amount * 100.0;
    let cents = scaled.round();
    if cents < 1.0 || (scaled - cents).abs() > CENT_TOLERANCE {
        return None;
    }
    Some(cents as i64)
}

// Summed in cents so a settled account compares equal to zero. An entry that
// cannot be read as cents, or a sum that overflows, counts as owing.
fn balance_minor_units(ledger: &[FeeTransaction], student_id: &str) -> i128 {
    let mut balance: i128 = 0;
    for entry in ledger.iter().filter(|entry| entry.student_id == student_id) {
        let signed = match (minor_units(entry.amount), entry.kind) {
            (Some(cents), TransactionKind::Bill) => i128::from(cents),
            (Some(cents), TransactionKind::Payment) => -i128::from(cents),
            (None, _) => return i128::MAX,
        };
        balance = match balance.checked_add(signed) {
            Some(next) => next,
            None => return i128::MAX,
        };
    }
    balance
}
