//! HTTP API for Files Manager.
//!
//! A thin axum adapter over the auth and file services: extractors resolve
//! the `X-Token` session header, handlers translate service errors into
//! `{"error": ...}` responses.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
