//! Test helpers for the HTTP API tests.
//!
//! Provides an in-process TestServer over memory backends and helpers
//! for registering users and opening sessions.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header::AUTHORIZATION, HeaderName};
use axum_test::TestServer;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};
use tempfile::TempDir;

use files_manager::cache::{ManualClock, MemoryCache};
use files_manager::db::MemoryStore;
use files_manager::file::FileStorage;
use files_manager::web::handlers::AppState;
use files_manager::web::router::{body_limit_for, create_router};

/// Session lifetime used by test servers.
pub const TEST_SESSION_TTL: Duration = Duration::from_secs(60);

/// Maximum content size used by test servers.
pub const TEST_MAX_UPLOAD: u64 = 1024 * 1024;

/// A test server plus handles on its backends.
pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<MemoryStore>,
    pub cache: Arc<MemoryCache>,
    pub clock: Arc<ManualClock>,
    _storage_dir: TempDir,
}

/// Create a test server over memory backends and a temporary storage folder.
pub fn create_test_app() -> TestApp {
    let storage_dir = TempDir::new().expect("Failed to create storage dir");
    let storage = FileStorage::new(storage_dir.path()).expect("Failed to create storage");

    let clock = Arc::new(ManualClock::new());
    let store = Arc::new(MemoryStore::new());
    let cache = Arc::new(MemoryCache::with_clock(clock.clone()));

    let app_state = AppState::new(store.clone(), cache.clone(), storage)
        .with_session_ttl(TEST_SESSION_TTL)
        .with_max_upload_size(TEST_MAX_UPLOAD);

    let router = create_router(Arc::new(app_state), &[], body_limit_for(TEST_MAX_UPLOAD));
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        store,
        cache,
        clock,
        _storage_dir: storage_dir,
    }
}

/// The session token header.
pub fn x_token() -> HeaderName {
    HeaderName::from_static("x-token")
}

/// `Authorization` header value for Basic credentials.
pub fn basic_auth(email: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{email}:{password}")))
}

/// Base64-encode file content for an upload body.
pub fn b64(content: &str) -> String {
    STANDARD.encode(content)
}

/// Register a user and return the response body.
pub async fn register(server: &TestServer, email: &str, password: &str) -> Value {
    let response = server
        .post("/users")
        .json(&json!({ "email": email, "password": password }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()
}

/// Open a session and return its token.
pub async fn connect(server: &TestServer, email: &str, password: &str) -> String {
    let response = server
        .get("/connect")
        .add_header(AUTHORIZATION, basic_auth(email, password))
        .await;
    response.assert_status_ok();
    response.json::<Value>()["token"]
        .as_str()
        .expect("token missing")
        .to_string()
}

/// Register a user, open a session, and return `(user_id, token)`.
pub async fn register_and_connect(server: &TestServer, email: &str) -> (String, String) {
    let user = register(server, email, "password123").await;
    let token = connect(server, email, "password123").await;
    (user["id"].as_str().expect("id missing").to_string(), token)
}

/// Upload a file and return the response body.
pub async fn upload(server: &TestServer, token: &str, body: Value) -> Value {
    let response = server
        .post("/files")
        .add_header(x_token(), token.to_string())
        .json(&body)
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()
}
