//! Transaction management with rollback-on-drop.
//!
//! SQLite serializes writers at the connection-pool level, so there is no
//! isolation-level knob or savepoint-based retry loop here, just a scoped
//! wrapper that commits explicitly or rolls back when dropped.

use std::ops::{Deref, DerefMut};

use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::error::{DbError, DbResult};

/// Transaction wrapper with automatic rollback on drop.
pub struct DbTransaction<'a> {
    tx: Option<Transaction<'a, Sqlite>>,
    committed: bool,
}

impl<'a> DbTransaction<'a> {
    /// Begin a new transaction on the given pool.
    pub async fn new(pool: &'a SqlitePool) -> DbResult<Self> {
        let tx = pool
            .begin()
            .await
            .map_err(|e| DbError::Generic(format!("failed to begin transaction: {e}")))?;
        Ok(Self {
            tx: Some(tx),
            committed: false,
        })
    }

    /// Commit the transaction.
    pub async fn commit(mut self) -> DbResult<()> {
        if let Some(tx) = self.tx.take() {
            tx.commit()
                .await
                .map_err(|e| DbError::Generic(format!("failed to commit: {e}")))?;
            self.committed = true;
        }
        Ok(())
    }

    /// Roll back the transaction explicitly.
    pub async fn rollback(mut self) -> DbResult<()> {
        if let Some(tx) = self.tx.take() {
            tx.rollback()
                .await
                .map_err(|e| DbError::Generic(format!("failed to rollback: {e}")))?;
        }
        Ok(())
    }

    /// Whether the transaction is still open.
    pub fn is_active(&self) -> bool {
        self.tx.is_some() && !self.committed
    }
}

impl<'a> Deref for DbTransaction<'a> {
    type Target = Transaction<'a, Sqlite>;

    fn deref(&self) -> &Self::Target {
        self.tx.as_ref().expect("transaction already consumed")
    }
}

impl<'a> DerefMut for DbTransaction<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.tx.as_mut().expect("transaction already consumed")
    }
}

impl<'a> Drop for DbTransaction<'a> {
    fn drop(&mut self) {
        if self.tx.is_some() && !self.committed {
            tracing::warn!("transaction dropped without commit or explicit rollback");
        }
    }
}

/// Runs a closure inside a transaction, committing on `Ok` and rolling back
/// on `Err`. Used by the pipeline's `write_clusters`/`insert_conflicts`
/// batch writes where a partial write would leave the tables inconsistent.
pub struct TransactionManager {
    pool: SqlitePool,
}

impl TransactionManager {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn execute<F, T>(&self, f: F) -> DbResult<T>
    where
        F: for<'a> FnOnce(
                &'a mut Transaction<'_, Sqlite>,
            ) -> std::pin::Pin<Box<dyn std::future::Future<Output = DbResult<T>> + Send + 'a>>
            + Send,
        T: Send,
    {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::Generic(format!("failed to begin transaction: {e}")))?;

        let result = f(&mut tx).await;

        match result {
            Ok(value) => {
                tx.commit()
                    .await
                    .map_err(|e| DbError::Generic(format!("failed to commit: {e}")))?;
                Ok(value)
            }
            Err(e) => {
                tx.rollback()
                    .await
                    .map_err(|rollback_err| {
                        DbError::Generic(format!(
                            "failed to rollback after error: {rollback_err}. original error: {e}"
                        ))
                    })?;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Pool;

    #[tokio::test]
    async fn rollback_leaves_no_committed_row() {
        let pool = Pool::in_memory().await.unwrap();
        sqlx::query("CREATE TABLE t (v INTEGER)")
            .execute(pool.inner())
            .await
            .unwrap();

        let mut tx = DbTransaction::new(pool.inner()).await.unwrap();
        sqlx::query("INSERT INTO t (v) VALUES (1)")
            .execute(&mut *tx)
            .await
            .unwrap();
        tx.rollback().await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM t")
            .fetch_one(pool.inner())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn commit_persists_the_write() {
        let pool = Pool::in_memory().await.unwrap();
        sqlx::query("CREATE TABLE t (v INTEGER)")
            .execute(pool.inner())
            .await
            .unwrap();

        let mut tx = DbTransaction::new(pool.inner()).await.unwrap();
        sqlx::query("INSERT INTO t (v) VALUES (1)")
            .execute(&mut *tx)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM t")
            .fetch_one(pool.inner())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
