//! User handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use crate::web::dto::{RegisterRequest, UserResponse, ValidatedJson};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthToken;

/// POST /users - Register a new user.
pub async fn post_new(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = state
        .auth
        .register(
            req.email.as_deref().unwrap_or_default(),
            req.password.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// GET /users/me - The user owning the session token.
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    AuthToken(token): AuthToken,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.auth.current_user(&token).await?;
    Ok(Json(user.into()))
}
