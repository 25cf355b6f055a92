use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{require_action, require_student_access, CurrentActor};
use crate::core::state::AppState;
use crate::core::time::{iso_date, today_utc};
use crate::registry::{FeeTransaction, GradeRecord, NewTransaction, Registry, Student};
use crate::schemas::student::{
    FeeAccountResponse, ResultsLockRequest, ResultsResponse, StudentCreate, StudentResponse,
    TransactionCreate,
};
use crate::services::role_policy::PortalAction;

pub(super) async fn upsert_student(
    CurrentActor(claims): CurrentActor,
    State(state): State<AppState>,
    Json(payload): Json<StudentCreate>,
) -> Result<(StatusCode, Json<StudentResponse>), ApiError> {
    require_action(&claims, PortalAction::EnrolStudent)?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let (student, upsert) = {
        let mut registry = state.registry().write().await;
        let id = payload.id.trim().to_string();
        let results_unlocked = payload.results_unlocked.unwrap_or_else(|| {
            registry.student(&id).is_some_and(|existing| existing.results_unlocked)
        });
        let student = Student {
            id,
            full_name: payload.full_name.trim().to_string(),
            class_id: payload.class_id.trim().to_string(),
            results_unlocked,
        };
        let upsert = registry.upsert_student(student.clone())?;
        (student, upsert)
    };
    tracing::info!(
        actor = %claims.sub,
        student_id = %student.id,
        created = upsert.created,
        records_created = upsert.records_created,
        "Student saved"
    );

    let status = if upsert.created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((
        status,
        Json(StudentResponse {
            id: student.id,
            full_name: student.full_name,
            class_id: student.class_id,
            results_unlocked: student.results_unlocked,
            created: upsert.created,
            records_created: upsert.records_created,
        }),
    ))
}

pub(super) async fn list_records(
    Path(student_id): Path<String>,
    CurrentActor(claims): CurrentActor,
    State(state): State<AppState>,
) -> Result<Json<Vec<GradeRecord>>, ApiError> {
    require_action(&claims, PortalAction::ViewRecords)?;

    let registry = state.registry().read().await;
    ensure_student(&registry, &student_id)?;
    Ok(Json(registry.records_by_student(&student_id)))
}

pub(super) async fn published_results(
    Path(student_id): Path<String>,
    CurrentActor(claims): CurrentActor,
    State(state): State<AppState>,
) -> Result<Json<ResultsResponse>, ApiError> {
    require_student_access(&claims, PortalAction::ViewResults, &student_id)?;

    let records = state.registry().read().await.published_results(&student_id)?;
    Ok(Json(ResultsResponse { student_id, records }))
}

pub(super) async fn fee_account(
    Path(student_id): Path<String>,
    CurrentActor(claims): CurrentActor,
    State(state): State<AppState>,
) -> Result<Json<FeeAccountResponse>, ApiError> {
    require_student_access(&claims, PortalAction::ViewFees, &student_id)?;

    let registry = state.registry().read().await;
    let student = ensure_student(&registry, &student_id)?;

    Ok(Json(FeeAccountResponse {
        balance: registry.fee_balance(&student_id),
        results_unlocked: student.results_unlocked,
        results_visible: registry.results_visible(&student_id),
        transactions: registry.transactions_for(&student_id),
        student_id,
    }))
}

pub(super) async fn record_fee(
    Path(student_id): Path<String>,
    CurrentActor(claims): CurrentActor,
    State(state): State<AppState>,
    Json(payload): Json<TransactionCreate>,
) -> Result<(StatusCode, Json<FeeTransaction>), ApiError> {
    require_action(&claims, PortalAction::RecordFee)?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let date = match payload.date.as_deref() {
        Some(raw) => iso_date::parse(raw).map_err(ApiError::BadRequest)?,
        None => today_utc(),
    };

    let transaction = state.registry().write().await.record_transaction(NewTransaction {
        id: payload.id,
        student_id,
        kind: payload.kind,
        amount: payload.amount,
        description: payload.description,
        date,
    })?;

    tracing::info!(
        actor = %claims.sub,
        student_id = %transaction.student_id,
        transaction_id = %transaction.id,
        kind = ?transaction.kind,
        amount = transaction.amount,
        "Fee transaction recorded"
    );

    Ok((StatusCode::CREATED, Json(transaction)))
}

pub(super) async fn set_results_lock(
    Path(student_id): Path<String>,
    CurrentActor(claims): CurrentActor,
    State(state): State<AppState>,
    Json(payload): Json<ResultsLockRequest>,
) -> Result<Json<FeeAccountResponse>, ApiError> {
    require_action(&claims, PortalAction::ToggleResults)?;

    let mut registry = state.registry().write().await;
    registry.set_results_unlocked(&student_id, payload.unlocked)?;
    tracing::info!(
        actor = %claims.sub,
        student_id = %student_id,
        unlocked = payload.unlocked,
        "Results lock set"
    );

    Ok(Json(FeeAccountResponse {
        balance: registry.fee_balance(&student_id),
        results_unlocked: payload.unlocked,
        results_visible: registry.results_visible(&student_id),
        transactions: registry.transactions_for(&student_id),
        student_id,
    }))
}

fn ensure_student<'a>(registry: &'a Registry, student_id: &str) -> Result<&'a Student, ApiError> {
    registry
        .student(student_id)
        .ok_or_else(|| ApiError::NotFound(format!("student {student_id} not found")))
}
