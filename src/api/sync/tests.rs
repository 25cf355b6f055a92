use std::sync::Arc;

use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::api;
use crate::core::config::Settings;
use crate::core::security::PortalRole;
use crate::core::state::AppState;
use crate::registry::Registry;
use crate::services::sync::{FileSnapshotSource, SnapshotSource};
use crate::test_support;

fn admissions_snapshot() -> serde_json::Value {
    json!({
        "students": [
            {"id": "s-20", "full_name": "Efe Udo", "class_id": "jss1", "results_unlocked": true}
        ],
        "transactions": [
            {"id": "t-20", "student_id": "s-20", "kind": "BILL", "amount": 300.0,
             "description": "Uniform", "date": "2025-01-07"}
        ]
    })
}

#[tokio::test]
async fn executive_imports_and_exports_snapshots() {
    let ctx = test_support::setup_test_context().await;
    test_support::seed_class(&ctx.state).await;
    let executive = test_support::bearer_token(ctx.state.settings(), PortalRole::Executive, "e-1");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/sync/import",
            Some(&executive),
            Some(admissions_snapshot()),
        ))
        .await
        .expect("import");
    assert_eq!(response.status(), StatusCode::OK);
    let report = test_support::read_json(response).await;
    assert_eq!(report["students_added"], 1);
    assert_eq!(report["records_created"], 1);
    assert_eq!(report["transactions_added"], 1);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/sync/snapshot",
            Some(&executive),
            None,
        ))
        .await
        .expect("snapshot");
    assert_eq!(response.status(), StatusCode::OK);
    let snapshot = test_support::read_json(response).await;
    assert_eq!(snapshot["students"].as_array().map(Vec::len), Some(4));
    assert_eq!(snapshot["grades"].as_array().map(Vec::len), Some(3));
    assert_eq!(snapshot["transactions"][0]["date"], "2025-01-07");
}

#[tokio::test]
async fn sync_endpoints_are_executive_only() {
    let ctx = test_support::setup_test_context().await;
    let accounts = test_support::bearer_token(ctx.state.settings(), PortalRole::Accounts, "acc-1");

    for (method, uri, body) in [
        (Method::GET, "/api/v1/sync/snapshot", None),
        (Method::POST, "/api/v1/sync/refresh", None),
        (Method::POST, "/api/v1/sync/import", Some(admissions_snapshot())),
    ] {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(method, uri, Some(&accounts), body))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");
    }
}

#[tokio::test]
async fn refresh_without_source_is_unavailable() {
    let ctx = test_support::setup_test_context().await;
    let executive = test_support::bearer_token(ctx.state.settings(), PortalRole::Executive, "e-1");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/sync/refresh",
            Some(&executive),
            None,
        ))
        .await
        .expect("refresh");
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn refresh_pulls_from_configured_file() {
    let _guard = test_support::env_lock().await;
    test_support::set_test_env();
    let settings = Settings::load().expect("settings");

    let path = std::env::temp_dir().join(format!("gradegate-api-{}.json", uuid::Uuid::new_v4()));
    std::fs::write(&path, serde_json::to_vec(&admissions_snapshot()).unwrap()).unwrap();

    let source: Arc<dyn SnapshotSource> = Arc::new(FileSnapshotSource::new(&path));
    let state = AppState::new(settings, Registry::new(), Some(source));
    let app = api::router::router(state.clone());
    let executive = test_support::bearer_token(state.settings(), PortalRole::Executive, "e-1");

    let response = app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/sync/refresh",
            Some(&executive),
            None,
        ))
        .await
        .expect("refresh");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(test_support::read_json(response).await["students_added"], 1);

    let registry = state.registry().read().await;
    assert!(registry.student("s-20").is_some());
    assert_eq!(registry.fee_balance("s-20"), 300.0);

    std::fs::remove_file(path).ok();
}
