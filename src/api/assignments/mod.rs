mod handlers;

use axum::{routing::get, routing::post, Router};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_assignment))
        .route("/:assignment_id/records", get(handlers::list_records))
        .route("/:assignment_id/summary", get(handlers::summary))
        .route("/:assignment_id/submit", post(handlers::submit))
        .route("/:assignment_id/review", post(handlers::review))
        .route("/:assignment_id/publish", post(handlers::publish))
}
