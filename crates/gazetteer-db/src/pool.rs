//! SQLite connection pool management, a thin wrapper over `sqlx::SqlitePool`
//! with a builder for the handful of knobs a local keyed row store needs.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::error::{DbError, DbResult};

/// Connection pool configuration.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Path to the SQLite database file (`:memory:` for an ephemeral pool).
    pub db_path: String,
    /// Maximum number of connections.
    pub max_connections: u32,
    /// Connection acquire timeout in seconds.
    pub connect_timeout: u64,
    /// Whether to create the database file if it does not exist.
    pub create_if_missing: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            db_path: "gazetteer.sqlite".to_string(),
            max_connections: 5,
            connect_timeout: 30,
            create_if_missing: true,
        }
    }
}

impl PoolConfig {
    /// Start a builder seeded with the defaults above.
    pub fn builder() -> PoolConfigBuilder {
        PoolConfigBuilder::default()
    }
}

/// Builder for [`PoolConfig`].
#[derive(Default)]
pub struct PoolConfigBuilder {
    db_path: Option<String>,
    max_connections: Option<u32>,
    connect_timeout: Option<u64>,
    create_if_missing: Option<bool>,
}

impl PoolConfigBuilder {
    pub fn db_path(mut self, path: impl Into<String>) -> Self {
        self.db_path = Some(path.into());
        self
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = Some(max);
        self
    }

    pub fn connect_timeout(mut self, timeout: u64) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = Some(create);
        self
    }

    pub fn build(self) -> PoolConfig {
        let default = PoolConfig::default();
        PoolConfig {
            db_path: self.db_path.unwrap_or(default.db_path),
            max_connections: self.max_connections.unwrap_or(default.max_connections),
            connect_timeout: self.connect_timeout.unwrap_or(default.connect_timeout),
            create_if_missing: self.create_if_missing.unwrap_or(default.create_if_missing),
        }
    }
}

/// Connection pool wrapper.
#[derive(Clone)]
pub struct Pool {
    inner: SqlitePool,
}

impl Pool {
    /// Open (and, per `create_if_missing`, create) the SQLite database.
    pub async fn new(config: PoolConfig) -> DbResult<Self> {
        let opts = SqliteConnectOptions::from_str(&config.db_path)
            .map_err(|e| DbError::PoolError(format!("invalid db_path {}: {e}", config.db_path)))?
            .create_if_missing(config.create_if_missing)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout))
            .connect_with(opts)
            .await
            .map_err(|e| DbError::PoolError(format!("failed to open {}: {e}", config.db_path)))?;

        Ok(Pool { inner: pool })
    }

    /// An in-memory pool, useful for tests and the `/compare` one-shot path.
    pub async fn in_memory() -> DbResult<Self> {
        Self::new(PoolConfig {
            db_path: ":memory:".to_string(),
            ..PoolConfig::default()
        })
        .await
    }

    /// The underlying `sqlx` pool.
    pub fn inner(&self) -> &SqlitePool {
        &self.inner
    }

    /// A simple liveness check.
    pub async fn health_check(&self) -> DbResult<HealthStatus> {
        let start = std::time::Instant::now();
        sqlx::query("SELECT 1")
            .execute(&self.inner)
            .await
            .map_err(|e| DbError::PoolError(format!("health check failed: {e}")))?;
        Ok(HealthStatus {
            healthy: true,
            latency_ms: start.elapsed().as_millis() as u64,
            connections: self.inner.size(),
            idle_connections: self.inner.num_idle(),
        })
    }

    /// Close the pool.
    pub async fn close(self) {
        self.inner.close().await;
    }
}

/// Health status of the database connection.
#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub healthy: bool,
    pub latency_ms: u64,
    pub connections: u32,
    pub idle_connections: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = PoolConfig::builder()
            .db_path("custom.sqlite")
            .max_connections(20)
            .build();
        assert_eq!(config.db_path, "custom.sqlite");
        assert_eq!(config.max_connections, 20);
    }

    #[tokio::test]
    async fn in_memory_pool_opens_and_health_checks() {
        let pool = Pool::in_memory().await.unwrap();
        let status = pool.health_check().await.unwrap();
        assert!(status.healthy);
    }
}
