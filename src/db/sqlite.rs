//! SQLite-backed document store.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::query::Query;
use sqlx::sqlite::{
    SqliteArguments, SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
};
use sqlx::{Row, Sqlite};
use tracing::{debug, info};

use super::schema::MIGRATIONS;
use super::{
    new_document_id, unique_value, Collection, Document, DocumentId, DocumentStore, Filter,
    FindOptions, ID_FIELD,
};
use crate::{FilesError, Result};

/// Connection pool type.
pub type DbPool = SqlitePool;

/// Database wrapper owning the SQLite pool.
///
/// Documents live in one `documents` table keyed by collection; field
/// filters are evaluated with `json_extract`. The same pool also backs
/// [`crate::cache::SqliteCache`].
#[derive(Debug, Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Open a database at the specified path, creating it if needed.
    ///
    /// Migrations are applied automatically.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening database at {:?}", path);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Open an in-memory database for testing.
    ///
    /// The pool holds a single connection that is never recycled, since every
    /// SQLite in-memory connection is its own database.
    pub async fn open_in_memory() -> Result<Self> {
        debug!("Opening in-memory database");
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Get the underlying pool.
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Close every connection. Later calls fail with `Unavailable`.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Get the current schema version.
    pub async fn schema_version(&self) -> Result<i64> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'
            )",
        )
        .fetch_one(&self.pool)
        .await?;

        if !exists {
            return Ok(0);
        }

        let version: i64 =
            sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM schema_version")
                .fetch_one(&self.pool)
                .await?;
        Ok(version)
    }

    /// Apply pending migrations.
    pub async fn migrate(&self) -> Result<()> {
        let current_version = self.schema_version().await?;

        if current_version as usize >= MIGRATIONS.len() {
            debug!("Database is up to date (version {})", current_version);
            return Ok(());
        }

        info!(
            "Migrating database from version {} to {}",
            current_version,
            MIGRATIONS.len()
        );

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version     INTEGER PRIMARY KEY,
                applied_at  TEXT NOT NULL DEFAULT (datetime('now'))
            )",
        )
        .execute(&self.pool)
        .await?;

        for (i, migration) in MIGRATIONS.iter().enumerate().skip(current_version as usize) {
            let version = (i + 1) as i64;
            debug!("Applying migration v{}", version);

            let mut tx = self.pool.begin().await?;
            sqlx::raw_sql(migration).execute(&mut *tx).await?;
            sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
                .bind(version)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
        }

        info!("Database migration complete (now at version {})", MIGRATIONS.len());
        Ok(())
    }
}

/// A value bound into a generated statement.
#[derive(Debug, Clone, PartialEq)]
enum Bind {
    Text(String),
    Int(i64),
    Real(f64),
}

/// Build the `WHERE` clause for a collection and filter.
fn where_clause(collection: Collection, filter: &Filter) -> Result<(String, Vec<Bind>)> {
    let mut clauses = vec!["collection = ?".to_string()];
    let mut binds = vec![Bind::Text(collection.as_str().to_string())];

    for (field, value) in filter.conditions() {
        if field == ID_FIELD {
            match value {
                Value::String(id) => {
                    clauses.push("id = ?".to_string());
                    binds.push(Bind::Text(id.clone()));
                }
                // Identifiers are always strings.
                _ => clauses.push("0".to_string()),
            }
            continue;
        }

        let path = Bind::Text(format!("$.{field}"));
        match value {
            Value::Null => {
                clauses.push("json_extract(body, ?) IS NULL".to_string());
                binds.push(path);
            }
            Value::Bool(b) => {
                clauses.push("json_type(body, ?) = ?".to_string());
                binds.push(path);
                binds.push(Bind::Text(if *b { "true" } else { "false" }.to_string()));
            }
            Value::String(s) => {
                clauses.push(
                    "json_type(body, ?) = 'text' AND json_extract(body, ?) = ?".to_string(),
                );
                binds.push(path.clone());
                binds.push(path);
                binds.push(Bind::Text(s.clone()));
            }
            Value::Number(n) => {
                clauses.push("json_extract(body, ?) = ?".to_string());
                binds.push(path);
                if let Some(i) = n.as_i64() {
                    binds.push(Bind::Int(i));
                } else {
                    binds.push(Bind::Real(n.as_f64().unwrap_or(f64::NAN)));
                }
            }
            Value::Array(_) | Value::Object(_) => {
                return Err(FilesError::Database(format!(
                    "unsupported filter value for field '{field}'"
                )));
            }
        }
    }

    Ok((clauses.join(" AND "), binds))
}

fn bind_all<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    binds: Vec<Bind>,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for bind in binds {
        query = match bind {
            Bind::Text(s) => query.bind(s),
            Bind::Int(i) => query.bind(i),
            Bind::Real(f) => query.bind(f),
        };
    }
    query
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

fn parse_body(body: &str) -> Result<Document> {
    Ok(serde_json::from_str(body)?)
}

#[async_trait]
impl DocumentStore for Database {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn insert_one(&self, collection: Collection, mut doc: Document) -> Result<DocumentId> {
        let id = new_document_id();
        doc.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        let body = serde_json::to_string(&doc)?;

        sqlx::query("INSERT INTO documents (collection, id, body) VALUES (?, ?, ?)")
            .bind(collection.as_str())
            .bind(&id)
            .bind(body)
            .execute(&self.pool)
            .await?;

        Ok(id)
    }

    async fn insert_unique(
        &self,
        collection: Collection,
        mut doc: Document,
        field: &str,
    ) -> Result<DocumentId> {
        let value = unique_value(&doc, field)?.to_string();
        let id = new_document_id();
        doc.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        let body = serde_json::to_string(&doc)?;

        // A single statement, so the existence check and the insert cannot
        // interleave with another writer. Unique indexes back it up.
        let result = sqlx::query(
            "INSERT INTO documents (collection, id, body)
             SELECT ?1, ?2, ?3
             WHERE NOT EXISTS (
                 SELECT 1 FROM documents
                 WHERE collection = ?1 AND json_extract(body, ?4) = ?5
             )",
        )
        .bind(collection.as_str())
        .bind(&id)
        .bind(body)
        .bind(format!("$.{field}"))
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                FilesError::Duplicate(field.to_string())
            } else {
                FilesError::from(e)
            }
        })?;

        if result.rows_affected() == 0 {
            return Err(FilesError::Duplicate(field.to_string()));
        }
        Ok(id)
    }

    async fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Document>> {
        let (clause, binds) = where_clause(collection, filter)?;
        let sql = format!("SELECT body FROM documents WHERE {clause} ORDER BY seq LIMIT 1");

        let row = bind_all(sqlx::query(&sql), binds)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let body: String = row.try_get(0)?;
                Ok(Some(parse_body(&body)?))
            }
            None => Ok(None),
        }
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        options: FindOptions,
    ) -> Result<Vec<Document>> {
        let (clause, mut binds) = where_clause(collection, filter)?;
        let sql =
            format!("SELECT body FROM documents WHERE {clause} ORDER BY seq LIMIT ? OFFSET ?");

        // SQLite treats a negative LIMIT as "no limit".
        let limit = options
            .limit
            .map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
        binds.push(Bind::Int(limit));
        binds.push(Bind::Int(i64::try_from(options.skip).unwrap_or(i64::MAX)));

        let rows = bind_all(sqlx::query(&sql), binds)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                let body: String = row.try_get(0)?;
                parse_body(&body)
            })
            .collect()
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        mut patch: Document,
    ) -> Result<bool> {
        patch.remove(ID_FIELD);
        if patch.is_empty() {
            return Ok(self.find_one(collection, filter).await?.is_some());
        }

        let (clause, filter_binds) = where_clause(collection, filter)?;
        // json_patch drops keys patched to null; a missing key and a null
        // key are equivalent for filters.
        let sql = format!(
            "UPDATE documents SET body = json_patch(body, ?)
             WHERE seq = (SELECT seq FROM documents WHERE {clause} ORDER BY seq LIMIT 1)"
        );

        let mut binds = vec![Bind::Text(serde_json::to_string(&patch)?)];
        binds.extend(filter_binds);

        let result = bind_all(sqlx::query(&sql), binds)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self, collection: Collection) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection = ?")
            .bind(collection.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn is_alive(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
