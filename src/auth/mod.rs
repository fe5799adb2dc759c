//! Authentication module for Files Manager.
//!
//! This module provides password hashing, user registration and
//! cache-backed session tokens.

mod password;
mod registration;
mod session;

pub use password::{
    hash_password, validate_password, verify_password, PasswordError, MAX_PASSWORD_LENGTH,
};
pub use registration::{register, RegistrationRequest};
pub use session::{session_key, AuthService, DEFAULT_SESSION_DURATION_SECS, SESSION_KEY_PREFIX};
