//! Database schema and migrations for Files Manager.
//!
//! Migrations are applied in order when the database is opened; the
//! `schema_version` table records how many have run.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: Document collections
    r#"
-- JSON documents; seq gives insertion order within a collection
CREATE TABLE documents (
    seq         INTEGER PRIMARY KEY AUTOINCREMENT,
    collection  TEXT NOT NULL,
    id          TEXT NOT NULL UNIQUE,
    body        TEXT NOT NULL,
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_documents_collection ON documents(collection, seq);
"#,
    // v2: Key-value cache with per-entry expiry
    r#"
CREATE TABLE cache_entries (
    key         TEXT PRIMARY KEY,
    value       TEXT NOT NULL,
    expires_at  INTEGER NOT NULL       -- unix milliseconds
);

CREATE INDEX idx_cache_entries_expires_at ON cache_entries(expires_at);
"#,
    // v3: Lookups by owner/email stay fast as collections grow
    r#"
CREATE INDEX idx_documents_user_id ON documents(collection, json_extract(body, '$.userId'));
CREATE INDEX idx_documents_email ON documents(collection, json_extract(body, '$.email'));
"#,
    // v4: One user per email
    r#"
DROP INDEX idx_documents_email;

CREATE UNIQUE INDEX idx_users_email ON documents(json_extract(body, '$.email'))
    WHERE collection = 'users';
"#,
];
