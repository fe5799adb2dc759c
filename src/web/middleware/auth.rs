//! Session token extractors.
//!
//! Clients present the token issued by `GET /connect` in the `X-Token`
//! header. A `token` query parameter is accepted as well, so that download
//! links can be opened directly in a browser.

use std::sync::Arc;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::FilesError;

/// Header carrying the session token.
pub const TOKEN_HEADER: &str = "x-token";

/// Read the session token from the header, falling back to the query string.
fn token_from_parts(parts: &Parts) -> Option<String> {
    let header = parts
        .headers
        .get(TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = header {
        return Some(token.to_string());
    }

    parts.uri.query()?.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key == "token" && !value.is_empty() {
            urlencoding::decode(value).ok().map(|s| s.into_owned())
        } else {
            None
        }
    })
}

/// The raw session token. Rejects with 401 when absent.
#[derive(Debug, Clone)]
pub struct AuthToken(pub String);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthToken {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        token_from_parts(parts)
            .map(AuthToken)
            .ok_or_else(ApiError::unauthorized)
    }
}

/// Extractor for authenticated users.
///
/// Resolves the session token to the user id it was issued for.
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let AuthToken(token) = AuthToken::from_request_parts(parts, state).await?;

        let user_id = state.auth.authenticate(&token).await.map_err(|e| {
            tracing::debug!(error = %e, "Session token rejected");
            ApiError::from(e)
        })?;

        Ok(AuthUser(user_id))
    }
}

/// Optional authentication extractor.
///
/// Similar to AuthUser, but a missing or invalid token yields `None`.
/// Only a cache outage is an error.
#[derive(Debug, Clone)]
pub struct OptionalAuthUser(pub Option<String>);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for OptionalAuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = token_from_parts(parts) else {
            return Ok(OptionalAuthUser(None));
        };

        match state.auth.authenticate(&token).await {
            Ok(user_id) => Ok(OptionalAuthUser(Some(user_id))),
            Err(FilesError::Unauthorized) => Ok(OptionalAuthUser(None)),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(uri: &str, token: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header("X-Token", token);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_token_from_header() {
        let p = parts("/users/me", Some("abc"));
        assert_eq!(token_from_parts(&p), Some("abc".to_string()));
    }

    #[test]
    fn test_token_from_query() {
        let p = parts("/files/1/data?size=100&token=a%2Db", None);
        assert_eq!(token_from_parts(&p), Some("a-b".to_string()));
    }

    #[test]
    fn test_header_wins_over_query() {
        let p = parts("/files/1/data?token=query", Some("header"));
        assert_eq!(token_from_parts(&p), Some("header".to_string()));
    }

    #[test]
    fn test_no_token() {
        assert_eq!(token_from_parts(&parts("/files", None)), None);
        assert_eq!(token_from_parts(&parts("/files?token=", Some(" "))), None);
    }
}
