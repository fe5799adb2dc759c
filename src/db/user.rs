//! User model for Files Manager.

use serde::{Deserialize, Serialize};

/// A registered user.
///
/// Users are created once at registration and never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID.
    #[serde(rename = "_id")]
    pub id: String,
    /// Email address, unique across users.
    pub email: String,
    /// Argon2 password hash (PHC string).
    #[serde(rename = "password")]
    pub password_hash: String,
}

/// Data for creating a new user.
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    /// Email address.
    pub email: String,
    /// Argon2 password hash (PHC string).
    #[serde(rename = "password")]
    pub password_hash: String,
}

impl NewUser {
    /// Create a new NewUser from an already-hashed password.
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password_hash: password_hash.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{from_document, to_document};

    #[test]
    fn test_new_user_document_fields() {
        let doc = to_document(&NewUser::new("a@b.com", "$argon2id$hash")).unwrap();
        assert_eq!(doc["email"], "a@b.com");
        assert_eq!(doc["password"], "$argon2id$hash");
        assert!(!doc.contains_key("_id"));
    }

    #[test]
    fn test_user_from_document() {
        let mut doc = to_document(&NewUser::new("a@b.com", "h")).unwrap();
        doc.insert("_id".to_string(), "u1".into());

        let user: User = from_document(doc).unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.email, "a@b.com");
        assert_eq!(user.password_hash, "h");
    }
}
