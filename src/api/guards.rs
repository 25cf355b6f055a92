use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts};

use crate::api::errors::ApiError;
use crate::core::security::{self, Claims};
use crate::core::state::AppState;
use crate::services::role_policy::{self, PortalAction};

/// Verified bearer-token claims of the caller.
pub(crate) struct CurrentActor(pub(crate) Claims);

#[async_trait]
impl FromRequestParts<AppState> for CurrentActor {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let claims = security::verify_token(token, app_state.settings())
            .map_err(|_| ApiError::Unauthorized("Invalid authentication credentials"))?;

        Ok(CurrentActor(claims))
    }
}

pub(crate) fn require_action(claims: &Claims, action: PortalAction) -> Result<(), ApiError> {
    if role_policy::may_perform(claims.role, action) {
        Ok(())
    } else {
        tracing::debug!(sub = %claims.sub, role = %claims.role, ?action, "Action denied");
        Err(ApiError::Forbidden("Not enough permissions for this action"))
    }
}

pub(crate) fn require_student_access(
    claims: &Claims,
    action: PortalAction,
    student_id: &str,
) -> Result<(), ApiError> {
    require_action(claims, action)?;

    if role_policy::may_access_student(claims, student_id) {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Not linked to this student"))
    }
}
