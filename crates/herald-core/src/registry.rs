//! Recipient registry: the durable store of broadcast subscribers.
//!
//! Backed by SQLite (sqlx) with a single `recipient` table keyed by the
//! opaque recipient id. Every operation is one SQL statement against a
//! WAL-mode pool, so the Telegram dispatcher and the HTTP trigger can call
//! in concurrently without cross-operation coordination.

use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};

use crate::domain::{Recipient, RecipientId};
use crate::{Error, Result};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_CONNECTIONS: u32 = 5;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS recipient (
    id            TEXT PRIMARY KEY,
    created_at    INTEGER NOT NULL,
    failure_count INTEGER NOT NULL DEFAULT 0
)";

/// SQLite-backed store of registered recipients and their consecutive
/// delivery-failure counters.
pub struct RecipientRegistry {
    pool: SqlitePool,
}

impl RecipientRegistry {
    /// Open (or create) the registry at `path`, creating the schema if the
    /// table does not exist yet.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            // WAL allows concurrent reads during writes.
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(BUSY_TIMEOUT);

        let unavailable = |source: sqlx::Error| Error::StorageUnavailable {
            path: path.to_path_buf(),
            source,
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .map_err(unavailable)?;

        sqlx::query(SCHEMA)
            .execute(&pool)
            .await
            .map_err(unavailable)?;

        Ok(Self { pool })
    }

    /// Release the underlying pool. Subsequent operations fail with
    /// [`Error::NotOpen`], as does a second `close`.
    pub async fn close(&self) -> Result<()> {
        let _ = self.pool()?;
        self.pool.close().await;
        Ok(())
    }

    fn pool(&self) -> Result<&SqlitePool> {
        if self.pool.is_closed() {
            return Err(Error::NotOpen);
        }
        Ok(&self.pool)
    }

    /// Register a recipient. Idempotent: an already-registered id is a
    /// silent success that preserves `created_at` and `failure_count`.
    pub async fn add(&self, id: &RecipientId) -> Result<()> {
        let pool = self.pool()?;

        if id.as_str().trim().is_empty() {
            return Err(Error::InvalidRecipient(id.as_str().to_string()));
        }

        sqlx::query(
            "INSERT INTO recipient (id, created_at, failure_count) VALUES (?, ?, 0)
             ON CONFLICT(id) DO NOTHING",
        )
        .bind(id.as_str())
        .bind(Utc::now().timestamp_millis())
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Remove a recipient. An absent id is a silent success.
    pub async fn remove(&self, id: &RecipientId) -> Result<()> {
        let pool = self.pool()?;

        sqlx::query("DELETE FROM recipient WHERE id = ?")
            .bind(id.as_str())
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Every registered recipient id. Order is whatever SQLite returns;
    /// callers must not rely on it beyond stability within one call.
    pub async fn list(&self) -> Result<Vec<RecipientId>> {
        let pool = self.pool()?;

        let rows: Vec<(String,)> = sqlx::query_as("SELECT id FROM recipient")
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(|(id,)| RecipientId(id)).collect())
    }

    /// Ids whose failure count is strictly greater than `threshold`.
    pub async fn list_failing(&self, threshold: i64) -> Result<Vec<RecipientId>> {
        let pool = self.pool()?;

        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT id FROM recipient WHERE failure_count > ?")
                .bind(threshold)
                .fetch_all(pool)
                .await?;

        Ok(rows.into_iter().map(|(id,)| RecipientId(id)).collect())
    }

    /// Current failure count for `id`, or [`Error::NotFound`] if it is not
    /// registered.
    pub async fn failure_count(&self, id: &RecipientId) -> Result<i64> {
        let pool = self.pool()?;

        let row: Option<(i64,)> =
            sqlx::query_as("SELECT failure_count FROM recipient WHERE id = ?")
                .bind(id.as_str())
                .fetch_optional(pool)
                .await?;

        row.map(|(count,)| count)
            .ok_or_else(|| Error::NotFound(id.as_str().to_string()))
    }

    /// Overwrite the failure counter. A no-op when `id` is absent (e.g. a
    /// concurrent removal won the race).
    pub async fn set_failure_count(&self, id: &RecipientId, count: i64) -> Result<()> {
        let pool = self.pool()?;

        sqlx::query("UPDATE recipient SET failure_count = ? WHERE id = ?")
            .bind(count)
            .bind(id.as_str())
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Full row lookup, `None` if the id is not registered.
    pub async fn get(&self, id: &RecipientId) -> Result<Option<Recipient>> {
        let pool = self.pool()?;

        let row = sqlx::query_as::<_, Recipient>(
            "SELECT id, created_at, failure_count FROM recipient WHERE id = ?",
        )
        .bind(id.as_str())
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }

    /// Number of registered recipients.
    pub async fn count(&self) -> Result<i64> {
        let pool = self.pool()?;

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipient")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn open_at(dir: &TempDir) -> RecipientRegistry {
        RecipientRegistry::open(dir.path().join("registry.db"))
            .await
            .unwrap()
    }

    fn rid(s: &str) -> RecipientId {
        RecipientId::new(s)
    }

    #[tokio::test]
    async fn open_creates_empty_registry() {
        let dir = TempDir::new().unwrap();
        let registry = open_at(&dir).await;

        assert_eq!(registry.count().await.unwrap(), 0);
        assert!(registry.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_starts_at_zero_failures() {
        let dir = TempDir::new().unwrap();
        let registry = open_at(&dir).await;

        registry.add(&rid("1001")).await.unwrap();

        let row = registry.get(&rid("1001")).await.unwrap().unwrap();
        assert_eq!(row.failure_count, 0);
        assert!(row.created_at > 0);
        assert_eq!(registry.failure_count(&rid("1001")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn add_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let registry = open_at(&dir).await;

        registry.add(&rid("42")).await.unwrap();
        let first = registry.get(&rid("42")).await.unwrap().unwrap();

        registry.set_failure_count(&rid("42"), 2).await.unwrap();
        registry.add(&rid("42")).await.unwrap();

        let second = registry.get(&rid("42")).await.unwrap().unwrap();
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.failure_count, 2);
        assert_eq!(registry.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn add_rejects_blank_ids() {
        let dir = TempDir::new().unwrap();
        let registry = open_at(&dir).await;

        assert!(matches!(
            registry.add(&rid("")).await,
            Err(Error::InvalidRecipient(_))
        ));
        assert!(matches!(
            registry.add(&rid("   ")).await,
            Err(Error::InvalidRecipient(_))
        ));
        assert_eq!(registry.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn remove_of_unknown_id_is_silent() {
        let dir = TempDir::new().unwrap();
        let registry = open_at(&dir).await;

        registry.remove(&rid("nope")).await.unwrap();
    }

    #[tokio::test]
    async fn list_failing_is_strictly_greater_than() {
        let dir = TempDir::new().unwrap();
        let registry = open_at(&dir).await;

        registry.add(&rid("at-threshold")).await.unwrap();
        registry.add(&rid("over-threshold")).await.unwrap();
        registry
            .set_failure_count(&rid("at-threshold"), 3)
            .await
            .unwrap();
        registry
            .set_failure_count(&rid("over-threshold"), 4)
            .await
            .unwrap();

        let failing = registry.list_failing(3).await.unwrap();
        assert_eq!(failing, vec![rid("over-threshold")]);
    }

    #[tokio::test]
    async fn failure_count_of_unknown_id_is_not_found() {
        let dir = TempDir::new().unwrap();
        let registry = open_at(&dir).await;

        assert!(matches!(
            registry.failure_count(&rid("ghost")).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn set_failure_count_on_unknown_id_is_a_noop() {
        let dir = TempDir::new().unwrap();
        let registry = open_at(&dir).await;

        registry.set_failure_count(&rid("ghost"), 7).await.unwrap();
        assert!(registry.get(&rid("ghost")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn operations_after_close_fail_with_not_open() {
        let dir = TempDir::new().unwrap();
        let registry = open_at(&dir).await;

        registry.close().await.unwrap();

        assert!(matches!(registry.add(&rid("1")).await, Err(Error::NotOpen)));
        assert!(matches!(registry.list().await, Err(Error::NotOpen)));
        assert!(matches!(registry.close().await, Err(Error::NotOpen)));
    }

    #[tokio::test]
    async fn registry_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("registry.db");

        let registry = RecipientRegistry::open(&path).await.unwrap();
        registry.add(&rid("persisted")).await.unwrap();
        registry.set_failure_count(&rid("persisted"), 2).await.unwrap();
        registry.close().await.unwrap();

        let reopened = RecipientRegistry::open(&path).await.unwrap();
        assert_eq!(reopened.list().await.unwrap(), vec![rid("persisted")]);
        assert_eq!(reopened.failure_count(&rid("persisted")).await.unwrap(), 2);
    }
}
