mod handlers;

use axum::{routing::get, routing::post, routing::put, Router};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::upsert_student))
        .route("/:student_id/records", get(handlers::list_records))
        .route("/:student_id/results", get(handlers::published_results))
        .route("/:student_id/fees", get(handlers::fee_account).post(handlers::record_fee))
        .route("/:student_id/results-lock", put(handlers::set_results_lock))
}
