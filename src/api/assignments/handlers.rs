use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{require_action, CurrentActor};
use crate::core::metrics;
use crate::core::security::Claims;
use crate::core::state::AppState;
use crate::core::time::{iso_date, today_utc};
use crate::registry::{AssignmentSummary, BatchAction, GradeRecord, NewAssignment, StatusChange};
use crate::schemas::assignment::{AssignmentCreate, AssignmentResponse, ReviewRequest};
use crate::services::role_policy::PortalAction;

pub(super) async fn create_assignment(
    CurrentActor(claims): CurrentActor,
    State(state): State<AppState>,
    Json(payload): Json<AssignmentCreate>,
) -> Result<(StatusCode, Json<AssignmentResponse>), ApiError> {
    require_action(&claims, PortalAction::CreateAssignment)?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let date = match payload.date.as_deref() {
        Some(raw) => iso_date::parse(raw).map_err(ApiError::BadRequest)?,
        None => today_utc(),
    };

    let mut registry = state.registry().write().await;
    let assignment = registry.create_assignment(NewAssignment {
        id: payload.id,
        class_id: payload.class_id,
        title: payload.title,
        max_score: payload.max_score,
        kind: payload.kind,
        date,
    })?;
    let records = registry.records_by_assignment(&assignment.id);

    tracing::info!(
        actor = %claims.sub,
        assignment_id = %assignment.id,
        class_id = %assignment.class_id,
        records = records.len(),
        "Assignment created"
    );

    Ok((StatusCode::CREATED, Json(AssignmentResponse { assignment, records })))
}

pub(super) async fn list_records(
    Path(assignment_id): Path<String>,
    CurrentActor(claims): CurrentActor,
    State(state): State<AppState>,
) -> Result<Json<Vec<GradeRecord>>, ApiError> {
    require_action(&claims, PortalAction::ViewRecords)?;

    let registry = state.registry().read().await;
    if registry.assignment(&assignment_id).is_none() {
        return Err(ApiError::NotFound(format!("assignment {assignment_id} not found")));
    }

    Ok(Json(registry.records_by_assignment(&assignment_id)))
}

pub(super) async fn summary(
    Path(assignment_id): Path<String>,
    CurrentActor(claims): CurrentActor,
    State(state): State<AppState>,
) -> Result<Json<AssignmentSummary>, ApiError> {
    require_action(&claims, PortalAction::ViewRecords)?;

    let registry = state.registry().read().await;
    Ok(Json(registry.assignment_summary(&assignment_id)?))
}

pub(super) async fn submit(
    Path(assignment_id): Path<String>,
    CurrentActor(claims): CurrentActor,
    State(state): State<AppState>,
) -> Result<Json<StatusChange>, ApiError> {
    require_action(&claims, PortalAction::SubmitBatch)?;
    transition_batch(&state, &claims, &assignment_id, BatchAction::Submit).await
}

pub(super) async fn review(
    Path(assignment_id): Path<String>,
    CurrentActor(claims): CurrentActor,
    State(state): State<AppState>,
    Json(payload): Json<ReviewRequest>,
) -> Result<Json<StatusChange>, ApiError> {
    require_action(&claims, PortalAction::ReviewBatch)?;
    transition_batch(&state, &claims, &assignment_id, payload.decision.into()).await
}

pub(super) async fn publish(
    Path(assignment_id): Path<String>,
    CurrentActor(claims): CurrentActor,
    State(state): State<AppState>,
) -> Result<Json<StatusChange>, ApiError> {
    require_action(&claims, PortalAction::PublishBatch)?;
    transition_batch(&state, &claims, &assignment_id, BatchAction::Publish).await
}

async fn transition_batch(
    state: &AppState,
    claims: &Claims,
    assignment_id: &str,
    action: BatchAction,
) -> Result<Json<StatusChange>, ApiError> {
    let result = state.registry().write().await.transition(assignment_id, action);
    metrics::record_transition(action, &result);

    match result {
        Ok(change) => {
            tracing::info!(
                actor = %claims.sub,
                role = %claims.role,
                %action,
                assignment_id,
                to = %change.to,
                "Batch moved"
            );
            Ok(Json(change))
        }
        Err(err) => {
            tracing::warn!(
                actor = %claims.sub,
                %action,
                assignment_id,
                error = %err,
                "Batch transition refused"
            );
            Err(err.into())
        }
    }
}
