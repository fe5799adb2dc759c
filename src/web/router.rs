//! Router configuration for the HTTP API.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    get_connect, get_disconnect, get_file_data, get_index, get_me, get_show, get_stats,
    get_status, post_new, post_upload, put_publish, put_unpublish, AppState,
};
use super::middleware::create_cors_layer;

/// Request body limit for a given content size limit.
///
/// Content travels base64-encoded inside JSON, which inflates it by a third.
pub fn body_limit_for(max_upload_bytes: u64) -> usize {
    const JSON_OVERHEAD: u64 = 64 * 1024;
    let limit = max_upload_bytes.saturating_mul(4) / 3 + JSON_OVERHEAD;
    usize::try_from(limit).unwrap_or(usize::MAX)
}

/// Create the main API router.
pub fn create_router(
    app_state: Arc<AppState>,
    cors_origins: &[String],
    body_limit: usize,
) -> Router {
    let app_routes = Router::new()
        .route("/status", get(get_status))
        .route("/stats", get(get_stats));

    let auth_routes = Router::new()
        .route("/connect", get(get_connect))
        .route("/disconnect", get(get_disconnect));

    let user_routes = Router::new()
        .route("/users", post(post_new))
        .route("/users/me", get(get_me));

    let file_routes = Router::new()
        .route("/files", post(post_upload).get(get_index))
        .route("/files/:id", get(get_show))
        .route("/files/:id/publish", put(put_publish))
        .route("/files/:id/unpublish", put(put_unpublish))
        .route("/files/:id/data", get(get_file_data));

    Router::new()
        .merge(app_routes)
        .merge(auth_routes)
        .merge(user_routes)
        .merge(file_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_limit_for() {
        assert_eq!(body_limit_for(0), 64 * 1024);
        assert_eq!(body_limit_for(3 * 1024), 4 * 1024 + 64 * 1024);
        assert!(body_limit_for(u64::MAX) > body_limit_for(u64::MAX / 8));
    }
}
