//! Web API Status/Stats Tests

mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{create_test_app, register_and_connect, upload};

#[tokio::test]
async fn test_status_all_up() {
    let app = create_test_app();

    let response = app.server.get("/status").await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({"redis": true, "db": true}));
}

#[tokio::test]
async fn test_status_reports_outages() {
    let app = create_test_app();
    app.cache.set_available(false);

    let response = app.server.get("/status").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({"redis": false, "db": true}));

    app.cache.set_available(true);
    app.store.set_available(false);

    let response = app.server.get("/status").await;
    assert_eq!(response.json::<Value>(), json!({"redis": true, "db": false}));
}

#[tokio::test]
async fn test_stats_counts() {
    let app = create_test_app();

    let response = app.server.get("/stats").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({"users": 0, "files": 0}));

    let (_, token) = register_and_connect(&app.server, "a@b.com").await;
    register_and_connect(&app.server, "c@d.com").await;
    upload(
        &app.server,
        &token,
        json!({"name": "dir", "type": "folder"}),
    )
    .await;

    let response = app.server.get("/stats").await;
    assert_eq!(response.json::<Value>(), json!({"users": 2, "files": 1}));
}

#[tokio::test]
async fn test_stats_store_down() {
    let app = create_test_app();
    app.store.set_available(false);

    let response = app.server.get("/stats").await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.json::<Value>()["error"], "Service unavailable");
}

#[tokio::test]
async fn test_unknown_route() {
    let app = create_test_app();

    let response = app.server.get("/nope").await;

    response.assert_status(StatusCode::NOT_FOUND);
}
