mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::{Duration, Utc};
use common::{test_alert, test_group, test_monitor, ScriptedProvider};
use hawkdash::api::{create_api_router, ApiState};
use hawkdash::{DataProvider, LiveDataStore, LocalStore, NotificationHub, MAX_WIDGETS};
use serde_json::{json, Value};
use std::sync::Arc;

async fn setup_test_api(provider: Arc<ScriptedProvider>) -> (TestServer, Arc<LiveDataStore>) {
    let store = Arc::new(LocalStore::open_in_memory().await.unwrap());
    let live = Arc::new(LiveDataStore::new(
        Arc::clone(&provider) as Arc<dyn DataProvider>
    ));
    let hub = Arc::new(NotificationHub::new());

    let state = ApiState {
        store,
        live: Arc::clone(&live),
        hub,
    };
    let server = TestServer::new(create_api_router(state)).unwrap();
    (server, live)
}

fn seeded_provider() -> Arc<ScriptedProvider> {
    let now = Utc::now();
    Arc::new(ScriptedProvider::with_data(
        vec![test_group(
            1,
            vec![test_monitor(1, true, false), test_monitor(2, false, false)],
        )],
        vec![test_alert(1, 2, 6, now, Duration::hours(2))],
    ))
}

#[tokio::test]
async fn test_health_endpoint() {
    let (server, _) = setup_test_api(Arc::new(ScriptedProvider::new())).await;
    let response = server.get("/api/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "hawkdash");
}

#[tokio::test]
async fn test_data_unavailable_before_first_refresh() {
    let (server, live) = setup_test_api(seeded_provider()).await;

    let response = server.get("/api/data").await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);

    live.refresh().await.unwrap();
    let response = server.get("/api/data").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["monitorGroups"].as_array().unwrap().len(), 1);
    assert_eq!(body["alerts"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_manual_refresh_endpoint() {
    let provider = seeded_provider();
    let (server, _) = setup_test_api(Arc::clone(&provider)).await;

    let response = server.post("/api/refresh").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["groups"], 1);

    provider.set_failing(true);
    let response = server.post("/api/refresh").await;
    response.assert_status(StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_refresh_schedule_toggle() {
    let (server, live) = setup_test_api(Arc::new(ScriptedProvider::new())).await;

    let response = server
        .put("/api/refresh/schedule")
        .json(&json!({"intervalSeconds": 30}))
        .await;
    response.assert_status_ok();
    assert!(live.refresh_enabled());

    let response = server
        .put("/api/refresh/schedule")
        .json(&json!({"intervalSeconds": null}))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["enabled"], false);
    assert!(!live.refresh_enabled());
}

#[tokio::test]
async fn test_widget_catalog_lists_all_kinds() {
    let (server, _) = setup_test_api(Arc::new(ScriptedProvider::new())).await;
    let response = server.get("/api/widgets/catalog").await;
    response.assert_status_ok();
    let body: Value = response.json();
    let widgets = body["widgets"].as_array().unwrap();
    assert_eq!(widgets.len(), 6);
    assert!(widgets.iter().any(|w| w["type"] == "sslStatus"));
    assert_eq!(widgets[0]["defaultSpan"]["w"], 4);
}

#[tokio::test]
async fn test_dashboard_crud_lifecycle() {
    let (server, _) = setup_test_api(Arc::new(ScriptedProvider::new())).await;

    // Create
    let response = server
        .post("/api/dashboards")
        .json(&json!({"name": "ops"}))
        .await;
    response.assert_status(StatusCode::CREATED);
    let id = response.json::<Value>()["id"].as_str().unwrap().to_string();

    // List
    let response = server.get("/api/dashboards").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["dashboards"].as_array().unwrap().len(), 1);
    assert_eq!(body["dashboards"][0]["name"], "ops");

    // Rename
    let response = server
        .put(&format!("/api/dashboards/{id}"))
        .json(&json!({"name": "ops v2"}))
        .await;
    response.assert_status(StatusCode::NO_CONTENT);

    let response = server.get(&format!("/api/dashboards/{id}")).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["name"], "ops v2");

    // Delete
    let response = server.delete(&format!("/api/dashboards/{id}")).await;
    response.assert_status(StatusCode::NO_CONTENT);
    let response = server.get(&format!("/api/dashboards/{id}")).await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_widget_add_patch_remove() {
    let (server, _) = setup_test_api(Arc::new(ScriptedProvider::new())).await;
    let response = server
        .post("/api/dashboards")
        .json(&json!({"name": "ops"}))
        .await;
    let id = response.json::<Value>()["id"].as_str().unwrap().to_string();

    // Add
    let response = server
        .post(&format!("/api/dashboards/{id}/widgets"))
        .json(&json!({"type": "statusBlocks"}))
        .await;
    response.assert_status(StatusCode::CREATED);
    let widget: Value = response.json();
    let widget_id = widget["id"].as_str().unwrap().to_string();
    assert_eq!(widget["title"], "Status Overview");

    // Patch title and merge config
    let response = server
        .patch(&format!("/api/dashboards/{id}/widgets/{widget_id}"))
        .json(&json!({
            "title": "Production status",
            "config": {"selectedMonitors": [1, 2]}
        }))
        .await;
    response.assert_status_ok();
    let patched: Value = response.json();
    assert_eq!(patched["title"], "Production status");
    assert_eq!(patched["config"]["selectedMonitors"], json!([1, 2]));

    // A second partial merge keeps the untouched key.
    let response = server
        .patch(&format!("/api/dashboards/{id}/widgets/{widget_id}"))
        .json(&json!({"config": {"extra": true}}))
        .await;
    response.assert_status_ok();
    let patched: Value = response.json();
    assert_eq!(patched["config"]["selectedMonitors"], json!([1, 2]));
    assert_eq!(patched["config"]["extra"], json!(true));

    // Remove
    let response = server
        .delete(&format!("/api/dashboards/{id}/widgets/{widget_id}"))
        .await;
    response.assert_status(StatusCode::NO_CONTENT);
    let response = server
        .delete(&format!("/api/dashboards/{id}/widgets/{widget_id}"))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_widget_limit_returns_conflict() {
    let (server, _) = setup_test_api(Arc::new(ScriptedProvider::new())).await;
    let response = server
        .post("/api/dashboards")
        .json(&json!({"name": "crowded"}))
        .await;
    let id = response.json::<Value>()["id"].as_str().unwrap().to_string();

    for _ in 0..MAX_WIDGETS {
        let response = server
            .post(&format!("/api/dashboards/{id}/widgets"))
            .json(&json!({"type": "uptimeMetric"}))
            .await;
        response.assert_status(StatusCode::CREATED);
    }

    let response = server
        .post(&format!("/api/dashboards/{id}/widgets"))
        .json(&json!({"type": "uptimeMetric"}))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    let response = server.get(&format!("/api/dashboards/{id}")).await;
    let body: Value = response.json();
    assert_eq!(body["widgets"].as_array().unwrap().len(), MAX_WIDGETS);
}

#[tokio::test]
async fn test_render_dashboard_against_snapshot() {
    let (server, live) = setup_test_api(seeded_provider()).await;
    let response = server
        .post("/api/dashboards")
        .json(&json!({"name": "ops"}))
        .await;
    let id = response.json::<Value>()["id"].as_str().unwrap().to_string();
    server
        .post(&format!("/api/dashboards/{id}/widgets"))
        .json(&json!({"type": "statusBlocks"}))
        .await
        .assert_status(StatusCode::CREATED);

    // No snapshot yet.
    let response = server.get(&format!("/api/dashboards/{id}/render")).await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);

    live.refresh().await.unwrap();
    let response = server.get(&format!("/api/dashboards/{id}/render")).await;
    response.assert_status_ok();
    let body: Value = response.json();
    let widgets = body["widgets"].as_array().unwrap();
    assert_eq!(widgets.len(), 1);
    assert_eq!(widgets[0]["view"]["kind"], "statusBlocks");
    assert_eq!(widgets[0]["view"]["online"], 1);
    assert_eq!(widgets[0]["view"]["offline"], 1);
}

#[tokio::test]
async fn test_unknown_dashboard_is_not_found() {
    let (server, _) = setup_test_api(Arc::new(ScriptedProvider::new())).await;
    let response = server.get("/api/dashboards/d-nope").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let response = server
        .post("/api/dashboards/d-nope/widgets")
        .json(&json!({"type": "uptimeMetric"}))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}
