use axum::extract::{Path, State};
use axum::{routing::patch, Json, Router};

use crate::api::errors::ApiError;
use crate::api::guards::{require_action, CurrentActor};
use crate::core::metrics;
use crate::core::state::AppState;
use crate::registry::GradeRecord;
use crate::schemas::assignment::GradeUpdate;
use crate::services::role_policy::PortalAction;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/:grade_id", patch(update_grade))
}

/// Score and remark are applied under one write lock; a refused score leaves
/// the remark untouched as well.
async fn update_grade(
    Path(grade_id): Path<String>,
    CurrentActor(claims): CurrentActor,
    State(state): State<AppState>,
    Json(payload): Json<GradeUpdate>,
) -> Result<Json<GradeRecord>, ApiError> {
    require_action(&claims, PortalAction::EditScores)?;

    if payload.score.is_none() && payload.remark.is_none() {
        return Err(ApiError::BadRequest("Provide a score or a remark".to_string()));
    }

    let mut registry = state.registry().write().await;
    let mut record = None;

    if let Some(score) = payload.score {
        let result = registry.set_score(&grade_id, score);
        metrics::record_score_update(&result);
        if let Err(err) = &result {
            tracing::warn!(
                actor = %claims.sub,
                grade_id = %grade_id,
                error = %err,
                "Score rejected"
            );
        }
        record = Some(result?);
    }

    if let Some(remark) = payload.remark.as_deref() {
        record = Some(registry.set_remark(&grade_id, Some(remark))?);
    }

    let record = record
        .ok_or_else(|| ApiError::Internal("Grade update produced no record".to_string()))?;
    tracing::debug!(
        actor = %claims.sub,
        grade_id = %grade_id,
        score = record.score,
        "Grade updated"
    );

    Ok(Json(record))
}
