use axum::extract::State;
use axum::{routing::get, routing::post, Json, Router};

use crate::api::errors::ApiError;
use crate::api::guards::{require_action, CurrentActor};
use crate::core::state::AppState;
use crate::registry::{RefreshReport, RegistrySnapshot};
use crate::services::role_policy::PortalAction;
use crate::services::sync;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/refresh", post(refresh))
        .route("/import", post(import))
        .route("/snapshot", get(snapshot))
}

/// Pulls from the configured source right away instead of waiting for the
/// next tick.
async fn refresh(
    CurrentActor(claims): CurrentActor,
    State(state): State<AppState>,
) -> Result<Json<RefreshReport>, ApiError> {
    require_action(&claims, PortalAction::RefreshRegistry)?;

    let Some(source) = state.sync_source().cloned() else {
        return Err(ApiError::ServiceUnavailable("Snapshot sync is not configured".to_string()));
    };

    let report = sync::refresh_registry(&state, source.as_ref())
        .await
        .map_err(|err| ApiError::ServiceUnavailable(format!("{err:#}")))?;
    tracing::info!(actor = %claims.sub, "Manual refresh completed");

    Ok(Json(report))
}

async fn import(
    CurrentActor(claims): CurrentActor,
    State(state): State<AppState>,
    Json(snapshot): Json<RegistrySnapshot>,
) -> Result<Json<RefreshReport>, ApiError> {
    require_action(&claims, PortalAction::RefreshRegistry)?;

    let origin = format!("import:{}", claims.sub);
    Ok(Json(sync::merge_snapshot(&state, snapshot, &origin).await))
}

async fn snapshot(
    CurrentActor(claims): CurrentActor,
    State(state): State<AppState>,
) -> Result<Json<RegistrySnapshot>, ApiError> {
    require_action(&claims, PortalAction::ExportSnapshot)?;

    Ok(Json(state.registry().read().await.snapshot()))
}

#[cfg(test)]
mod tests;
