//! Web server for Files Manager.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;

use crate::cache::{Cache, MemoryCache, SqliteCache};
use crate::config::{Backend, Config};
use crate::db::{Database, DocumentStore, MemoryStore};
use crate::file::FileStorage;
use crate::{FilesError, Result};

use super::handlers::AppState;
use super::router::{body_limit_for, create_router};

/// Web server for the API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// Allowed CORS origins.
    cors_origins: Vec<String>,
    /// Maximum request body size in bytes.
    body_limit: usize,
    /// How often expired cache entries are purged.
    purge_interval: Duration,
}

impl WebServer {
    /// Create a new web server around prepared application state.
    ///
    /// Limits in `app_state` are left as they are; `config` supplies the
    /// listening address, CORS origins and purge interval.
    pub fn new(config: &Config, app_state: AppState) -> Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| FilesError::Config(format!("invalid server address: {e}")))?;

        Ok(Self {
            addr,
            app_state: Arc::new(app_state),
            cors_origins: config.server.cors_origins.clone(),
            body_limit: body_limit_for(config.files.max_upload_size_mb.saturating_mul(1024 * 1024)),
            purge_interval: Duration::from_secs(config.cache.purge_interval_secs.max(1)),
        })
    }

    /// Open the configured backends and create a web server over them.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let sqlite = if config.database.backend == Backend::Sqlite
            || config.cache.backend == Backend::Sqlite
        {
            Some(Database::open(&config.database.path).await?)
        } else {
            None
        };

        let store: Arc<dyn DocumentStore> = match (&sqlite, config.database.backend) {
            (Some(db), Backend::Sqlite) => Arc::new(db.clone()),
            _ => Arc::new(MemoryStore::new()),
        };
        let cache: Arc<dyn Cache> = match (&sqlite, config.cache.backend) {
            (Some(db), Backend::Sqlite) => Arc::new(SqliteCache::new(db.pool().clone())),
            _ => Arc::new(MemoryCache::new()),
        };

        let storage = FileStorage::new(&config.files.storage_path)?;
        tracing::info!(
            store = store.backend_name(),
            cache = cache.backend_name(),
            storage = %storage.base_path().display(),
            "Backends initialized"
        );

        let max_upload_bytes = config.files.max_upload_size_mb.saturating_mul(1024 * 1024);
        let app_state = AppState::new(store, cache, storage)
            .with_session_ttl(Duration::from_secs(config.cache.session_ttl_secs))
            .with_max_upload_size(max_upload_bytes)
            .with_page_size(config.files.page_size);

        Self::new(config, app_state)
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Shared application state.
    pub fn app_state(&self) -> Arc<AppState> {
        self.app_state.clone()
    }

    /// Start the cache purge background task.
    ///
    /// Expired sessions are already invisible to reads; this only reclaims
    /// their storage.
    fn start_cache_purge_task(cache: Arc<dyn Cache>, every: Duration) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);

            // Skip the first immediate tick
            interval.tick().await;

            loop {
                interval.tick().await;

                match cache.purge_expired().await {
                    Ok(count) if count > 0 => {
                        tracing::info!(deleted_count = count, "Purged expired sessions");
                    }
                    Ok(_) => tracing::debug!("No expired sessions to purge"),
                    Err(e) => tracing::warn!(error = %e, "Failed to purge expired sessions"),
                }
            }
        });
    }

    fn build_router(&self) -> Router {
        create_router(self.app_state.clone(), &self.cors_origins, self.body_limit)
            .layer(CompressionLayer::new())
    }

    async fn bind(self) -> std::io::Result<(TcpListener, Router)> {
        let router = self.build_router();
        let listener = TcpListener::bind(self.addr).await?;

        Self::start_cache_purge_task(self.app_state.cache.clone(), self.purge_interval);
        tracing::info!(
            every_secs = self.purge_interval.as_secs(),
            "Session purge task started"
        );

        Ok((listener, router))
    }

    /// Run the web server.
    pub async fn run(self) -> std::io::Result<()> {
        let (listener, router) = self.bind().await?;
        tracing::info!("Web server listening on http://{}", listener.local_addr()?);

        axum::serve(listener, router).await
    }

    /// Run the server in the background and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> std::io::Result<SocketAddr> {
        let (listener, router) = self.bind().await?;
        let local_addr = listener.local_addr()?;
        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn create_test_config(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0;
        config.database.backend = Backend::Memory;
        config.cache.backend = Backend::Memory;
        config.files.storage_path = dir.path().join("files").to_string_lossy().into_owned();
        config
    }

    #[tokio::test]
    async fn test_web_server_from_config() {
        let dir = TempDir::new().unwrap();
        let config = create_test_config(&dir);

        let server = WebServer::from_config(&config).await.unwrap();
        assert_eq!(server.addr().ip().to_string(), "127.0.0.1");
        assert_eq!(server.app_state().store.backend_name(), "memory");
        assert!(dir.path().join("files").is_dir());
    }

    #[tokio::test]
    async fn test_web_server_sqlite_backends() {
        let dir = TempDir::new().unwrap();
        let mut config = create_test_config(&dir);
        config.database.backend = Backend::Sqlite;
        config.cache.backend = Backend::Sqlite;
        config.database.path = dir.path().join("fm.db").to_string_lossy().into_owned();

        let server = WebServer::from_config(&config).await.unwrap();
        let state = server.app_state();
        assert_eq!(state.store.backend_name(), "sqlite");
        assert_eq!(state.cache.backend_name(), "sqlite");
        assert!(state.store.is_alive().await);
        assert!(state.cache.is_alive().await);
    }

    #[tokio::test]
    async fn test_invalid_address() {
        let dir = TempDir::new().unwrap();
        let mut config = create_test_config(&dir);
        config.server.host = "not an address".to_string();

        assert!(matches!(
            WebServer::from_config(&config).await,
            Err(FilesError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_web_server_run() {
        let dir = TempDir::new().unwrap();
        let config = create_test_config(&dir);

        let server = WebServer::from_config(&config).await.unwrap();
        let addr = server.run_with_addr().await.unwrap();
        assert_ne!(addr.port(), 0);

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /status HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains(r#"{"redis":true,"db":true}"#));
    }
}
