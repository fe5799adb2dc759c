//! Service health handlers.

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::web::dto::{StatsResponse, StatusResponse};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// GET /status - Liveness of the cache and the document store.
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let (redis, db) = tokio::join!(state.cache.is_alive(), state.store.is_alive());
    Json(StatusResponse { redis, db })
}

/// GET /stats - Number of users and files.
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatsResponse>, ApiError> {
    let users = state.users().count().await?;
    let files = state.files.count().await?;
    Ok(Json(StatsResponse { users, files }))
}
