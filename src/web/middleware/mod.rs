//! Middleware for the HTTP API.

pub mod auth;
pub mod cors;

pub use auth::{AuthToken, AuthUser, OptionalAuthUser, TOKEN_HEADER};
pub use cors::create_cors_layer;
