//! Schema versioning for the SQLite-backed tabular store. Each migration is
//! a plain `CREATE TABLE` statement; a `_migrations` tracking table records
//! which versions have been applied so `migrate` is idempotent.

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::error::{DbError, DbResult};
use crate::pool::Pool;

/// One schema migration: a monotonic version, a name, and the SQL to apply.
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: i32,
    pub name: String,
    pub up: String,
}

impl Migration {
    pub fn new(version: i32, name: impl Into<String>, up: impl Into<String>) -> Self {
        Migration {
            version,
            name: name.into(),
            up: up.into(),
        }
    }
}

/// Applies pending migrations and tracks which versions have run.
pub struct MigrationManager {
    pool: SqlitePool,
}

impl MigrationManager {
    pub fn new(pool: &Pool) -> Self {
        MigrationManager {
            pool: pool.inner().clone(),
        }
    }

    async fn init(&self) -> DbResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::MigrationError(format!("failed to create _migrations table: {e}")))?;
        Ok(())
    }

    async fn current_version(&self) -> DbResult<i32> {
        let version: Option<i32> = sqlx::query_scalar("SELECT MAX(version) FROM _migrations")
            .fetch_optional(&self.pool)
            .await?
            .flatten();
        Ok(version.unwrap_or(0))
    }

    async fn apply(&self, migration: &Migration) -> DbResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::MigrationError(format!("failed to start transaction: {e}")))?;

        sqlx::query(&migration.up)
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::MigrationError(format!("migration {} failed: {e}", migration.version)))?;

        sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
            .bind(migration.version)
            .bind(&migration.name)
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::MigrationError(format!("failed to record migration {}: {e}", migration.version)))?;

        tx.commit()
            .await
            .map_err(|e| DbError::MigrationError(format!("failed to commit migration {}: {e}", migration.version)))?;
        Ok(())
    }

    /// Run every migration whose version is newer than the currently
    /// applied max, in ascending order.
    pub async fn migrate(&self, migrations: &[Migration]) -> DbResult<()> {
        self.init().await?;
        let current = self.current_version().await?;
        for migration in migrations {
            if migration.version > current {
                self.apply(migration).await?;
            }
        }
        Ok(())
    }

    /// All applied migration records, for diagnostics (`gazetteer db status`).
    pub async fn applied_migrations(&self) -> DbResult<Vec<(i32, String, DateTime<Utc>)>> {
        let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .iter()
            .map(|row| (row.get("version"), row.get("name"), row.get("applied_at")))
            .collect())
    }
}

/// The schema migrations for the nine logical tables in §6.
pub fn default_migrations() -> Vec<Migration> {
    vec![
        Migration::new(
            1,
            "address_records",
            r#"
            CREATE TABLE IF NOT EXISTS address_records (
                rid TEXT PRIMARY KEY,
                source TEXT NOT NULL,
                raw_address TEXT NOT NULL,
                district_claim TEXT,
                grid_district TEXT,
                lat REAL,
                lon REAL,
                extra_json TEXT,
                created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )
            "#,
        ),
        Migration::new(
            2,
            "parsed_addresses",
            r#"
            CREATE TABLE IF NOT EXISTS parsed_addresses (
                rid TEXT PRIMARY KEY REFERENCES address_records(rid),
                norm_text TEXT NOT NULL,
                province TEXT,
                city TEXT,
                district TEXT,
                street TEXT,
                road TEXT,
                road_no TEXT,
                aoi TEXT,
                building TEXT,
                unit TEXT,
                floor TEXT,
                room TEXT,
                shop_name TEXT,
                intersection_json TEXT,
                direction TEXT,
                distance_m INTEGER,
                parsed_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )
            "#,
        ),
        Migration::new(
            3,
            "roads",
            r#"
            CREATE TABLE IF NOT EXISTS roads (
                road_id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                district TEXT,
                aliases_json TEXT
            )
            "#,
        ),
        Migration::new(
            4,
            "pois",
            r#"
            CREATE TABLE IF NOT EXISTS pois (
                poi_id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                poi_type TEXT,
                district TEXT,
                lat REAL NOT NULL,
                lon REAL NOT NULL,
                aliases_json TEXT
            )
            "#,
        ),
        Migration::new(
            5,
            "anchors",
            r#"
            CREATE TABLE IF NOT EXISTS anchors (
                anchor_id TEXT PRIMARY KEY,
                anchor_type TEXT,
                key_text TEXT NOT NULL UNIQUE,
                district TEXT,
                lat REAL NOT NULL,
                lon REAL NOT NULL
            )
            "#,
        ),
        Migration::new(
            6,
            "conflicts",
            r#"
            CREATE TABLE IF NOT EXISTS conflicts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                rid TEXT NOT NULL REFERENCES address_records(rid),
                conflict_type TEXT NOT NULL,
                detail TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )
            "#,
        ),
        Migration::new(
            7,
            "match_logs",
            r#"
            CREATE TABLE IF NOT EXISTS match_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                rid_query TEXT NOT NULL,
                candidate_rids_json TEXT NOT NULL,
                pre_scores_json TEXT NOT NULL,
                final_json TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )
            "#,
        ),
        Migration::new(
            8,
            "clusters",
            r#"
            CREATE TABLE IF NOT EXISTS clusters (
                cluster_id TEXT NOT NULL,
                rid TEXT NOT NULL,
                PRIMARY KEY (cluster_id, rid)
            )
            "#,
        ),
        Migration::new(
            9,
            "pair_labels",
            r#"
            CREATE TABLE IF NOT EXISTS pair_labels (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                rid1 TEXT NOT NULL,
                rid2 TEXT NOT NULL,
                label INTEGER NOT NULL
            )
            "#,
        ),
    ]
}
