//! Authentication handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::{
    headers::{authorization::Basic, Authorization},
    TypedHeader,
};

use crate::web::dto::TokenResponse;
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthToken;

/// GET /connect - Exchange Basic credentials for a session token.
pub async fn get_connect(
    State(state): State<Arc<AppState>>,
    credentials: Option<TypedHeader<Authorization<Basic>>>,
) -> Result<Json<TokenResponse>, ApiError> {
    let TypedHeader(Authorization(basic)) = credentials.ok_or_else(ApiError::unauthorized)?;

    let token = state.auth.login(basic.username(), basic.password()).await?;
    Ok(Json(TokenResponse { token }))
}

/// GET /disconnect - Close the session.
pub async fn get_disconnect(
    State(state): State<Arc<AppState>>,
    AuthToken(token): AuthToken,
) -> Result<StatusCode, ApiError> {
    state.auth.logout(&token).await?;
    Ok(StatusCode::NO_CONTENT)
}
