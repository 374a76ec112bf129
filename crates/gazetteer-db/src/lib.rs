//! Gazetteer Database Layer
//!
//! SQLite-backed persistence for the address-resolution engine: connection
//! pooling, schema migrations, and the concrete [`Repository`] implementation
//! the engine reads and writes through.
//!
//! # Example
//!
//! ```rust,no_run
//! use gazetteer_db::{Pool, PoolConfig, init_database, SqliteRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = Pool::new(PoolConfig::builder().db_path("gazetteer.sqlite").build()).await?;
//!     init_database(&pool).await?;
//!     let repo = SqliteRepository::new(&pool);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod migrations;
pub mod models;
pub mod pool;
pub mod repository;
pub mod transaction;

pub use error::{DbError, DbResult};
pub use migrations::{default_migrations, Migration, MigrationManager};
pub use pool::{HealthStatus, Pool, PoolConfig, PoolConfigBuilder};
pub use repository::SqliteRepository;
pub use transaction::{DbTransaction, TransactionManager};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Open (if needed, create) the database file and bring its schema up to date.
pub async fn init_database(pool: &Pool) -> DbResult<()> {
    let migrator = MigrationManager::new(pool);
    migrator.migrate(&default_migrations()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[tokio::test]
    async fn init_database_is_idempotent_on_in_memory_pool() {
        let pool = Pool::in_memory().await.unwrap();
        init_database(&pool).await.unwrap();
        init_database(&pool).await.unwrap();
    }
}
