use std::sync::{Arc, OnceLock};

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
    Router,
};
use time::macros::date;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::api;
use crate::core::security::{self, PortalRole};
use crate::core::{config::Settings, state::AppState};
use crate::registry::{AssignmentKind, NewAssignment, Registry, Student};

pub(crate) const TEST_SECRET_KEY: &str = "test-secret";

pub(crate) struct TestContext {
    pub(crate) state: AppState,
    pub(crate) app: Router,
    _guard: OwnedMutexGuard<()>,
}

pub(crate) async fn env_lock() -> OwnedMutexGuard<()> {
    static LOCK: OnceLock<Arc<Mutex<()>>> = OnceLock::new();
    let lock = LOCK.get_or_init(|| Arc::new(Mutex::new(()))).clone();
    lock.lock_owned().await
}

pub(crate) fn set_test_env() {
    std::env::set_var("GRADEGATE_ENV", "test");
    std::env::set_var("GRADEGATE_STRICT_CONFIG", "0");
    std::env::set_var("SECRET_KEY", TEST_SECRET_KEY);
    std::env::set_var("PROMETHEUS_ENABLED", "0");
    for key in [
        "ENVIRONMENT",
        "PROJECT_NAME",
        "VERSION",
        "API_V1_STR",
        "ALGORITHM",
        "ACCESS_TOKEN_EXPIRE_MINUTES",
        "BACKEND_CORS_ORIGINS",
        "SYNC_SOURCE",
        "SYNC_FILE_PATH",
        "SYNC_URL",
        "SYNC_API_KEY",
        "SYNC_INTERVAL_SECONDS",
        "SYNC_TIMEOUT_SECONDS",
    ] {
        std::env::remove_var(key);
    }
}

pub(crate) async fn setup_test_context() -> TestContext {
    let guard = env_lock().await;
    set_test_env();
    context_with_current_env(guard)
}

/// Builds a context from whatever the environment holds right now. The caller
/// keeps the env lock and hands it over.
pub(crate) fn context_with_current_env(guard: OwnedMutexGuard<()>) -> TestContext {
    let settings = Settings::load().expect("settings");
    let state = AppState::new(settings, Registry::new(), None);
    let app = api::router::router(state.clone());

    TestContext { state, app, _guard: guard }
}

/// Two pupils in `jss1`, one in `jss2`, and a DRAFT maths test for `jss1`.
pub(crate) async fn seed_class(state: &AppState) {
    let mut registry = state.registry().write().await;
    for (id, name, class_id) in
        [("s-1", "Ada Obi", "jss1"), ("s-2", "Bayo Ade", "jss1"), ("s-3", "Chi Eze", "jss2")]
    {
        registry
            .upsert_student(Student {
                id: id.to_string(),
                full_name: name.to_string(),
                class_id: class_id.to_string(),
                results_unlocked: false,
            })
            .expect("seed student");
    }

    registry
        .create_assignment(NewAssignment {
            id: Some("a-1".to_string()),
            class_id: "jss1".to_string(),
            title: "Maths test".to_string(),
            max_score: 100,
            kind: AssignmentKind::Test,
            date: date!(2025 - 01 - 10),
        })
        .expect("seed assignment");
}

pub(crate) async fn grade_id_for(
    state: &AppState,
    assignment_id: &str,
    student_id: &str,
) -> String {
    state
        .registry()
        .read()
        .await
        .records_by_assignment(assignment_id)
        .into_iter()
        .find(|record| record.student_id == student_id)
        .map(|record| record.id)
        .expect("grade record")
}

pub(crate) fn bearer_token(settings: &Settings, role: PortalRole, sub: &str) -> String {
    security::create_access_token(sub, role, &[], settings, None).expect("token")
}

pub(crate) fn family_token(settings: &Settings, role: PortalRole, student_ids: &[&str]) -> String {
    let linked = student_ids.iter().map(|id| id.to_string()).collect::<Vec<_>>();
    security::create_access_token("family-1", role, &linked, settings, None).expect("token")
}

pub(crate) fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    if let Some(body) = body {
        let bytes = serde_json::to_vec(&body).expect("serialize body");
        builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(bytes))
            .expect("request body")
    } else {
        builder.body(Body::empty()).expect("request body")
    }
}

pub(crate) async fn read_json(response: axum::response::Response<Body>) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("response body");
    serde_json::from_slice(&body).unwrap_or_else(|err| {
        let body_text = String::from_utf8_lossy(&body);
        panic!("json parse: {err}; body: {body_text}");
    })
}
