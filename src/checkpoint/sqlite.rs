//! SQLite checkpoint store.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};

use super::locks::{ThreadLease, ThreadLocks};
use super::{ensure_extends, ensure_thread_id, Checkpoint, CheckpointStore};
use crate::error::ThreadloopError;
use crate::types::ConversationState;

/// One row per thread holding its latest snapshot as JSON.
#[derive(Clone)]
pub struct SqliteCheckpointStore {
    pool: Arc<SqlitePool>,
    locks: ThreadLocks,
    leases: ThreadLocks,
}

impl SqliteCheckpointStore {
    /// Open (creating if needed) the database at `path`.
    pub async fn open(path: &Path) -> Result<Self, ThreadloopError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|err| {
                ThreadloopError::Configuration(format!(
                    "cannot create checkpoint directory '{}': {err}",
                    parent.display()
                ))
            })?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", path.display()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        Self::with_pool(pool).await
    }

    /// Private in-memory database, mostly for tests.
    pub async fn in_memory() -> Result<Self, ThreadloopError> {
        // A second connection would see a different empty database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self, ThreadloopError> {
        let store = Self {
            pool: Arc::new(pool),
            locks: ThreadLocks::new(),
            leases: ThreadLocks::new(),
        };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), ThreadloopError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS checkpoints (
                thread_id TEXT PRIMARY KEY,
                version INTEGER NOT NULL,
                message_count INTEGER NOT NULL,
                messages_json TEXT NOT NULL,
                saved_at TEXT NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    async fn read(&self, thread_id: &str) -> Result<Option<ConversationState>, ThreadloopError> {
        let row = sqlx::query(
            "SELECT version, messages_json, saved_at FROM checkpoints WHERE thread_id = ?1",
        )
        .bind(thread_id)
        .fetch_optional(self.pool.as_ref())
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let version: i64 = row.try_get("version")?;
        let messages_json: String = row.try_get("messages_json")?;
        let saved_at: String = row.try_get("saved_at")?;
        let checkpoint = Checkpoint {
            version: u32::try_from(version).unwrap_or(u32::MAX),
            thread_id: thread_id.to_string(),
            saved_at: chrono::DateTime::parse_from_rfc3339(&saved_at)
                .map(|t| t.with_timezone(&chrono::Utc))
                .map_err(|err| ThreadloopError::checkpoint(thread_id, format!("bad saved_at: {err}")))?,
            messages: serde_json::from_str(&messages_json).map_err(|err| {
                ThreadloopError::checkpoint(thread_id, format!("unreadable messages: {err}"))
            })?,
        };
        checkpoint.into_state().map(Some)
    }
}

#[async_trait]
impl CheckpointStore for SqliteCheckpointStore {
    async fn load(&self, thread_id: &str) -> Result<Option<ConversationState>, ThreadloopError> {
        ensure_thread_id(thread_id)?;
        self.read(thread_id).await
    }

    async fn save(&self, state: &ConversationState) -> Result<(), ThreadloopError> {
        let thread_id = state.thread_id.as_str();
        ensure_thread_id(thread_id)?;
        let _guard = self.locks.acquire(thread_id).await;

        let stored = self.read(thread_id).await?;
        ensure_extends(stored.as_ref(), state)?;

        let checkpoint = Checkpoint::new(state);
        let messages_json = serde_json::to_string(&checkpoint.messages)
            .map_err(|err| ThreadloopError::checkpoint(thread_id, err.to_string()))?;
        sqlx::query(
            r#"
            INSERT INTO checkpoints (thread_id, version, message_count, messages_json, saved_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(thread_id) DO UPDATE SET
                version = excluded.version,
                message_count = excluded.message_count,
                messages_json = excluded.messages_json,
                saved_at = excluded.saved_at
            "#,
        )
        .bind(thread_id)
        .bind(i64::from(checkpoint.version))
        .bind(checkpoint.messages.len() as i64)
        .bind(messages_json)
        .bind(checkpoint.saved_at.to_rfc3339())
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    async fn list_threads(&self) -> Result<Vec<String>, ThreadloopError> {
        let rows = sqlx::query("SELECT thread_id FROM checkpoints ORDER BY thread_id")
            .fetch_all(self.pool.as_ref())
            .await?;
        rows.iter()
            .map(|row| row.try_get::<String, _>("thread_id").map_err(Into::into))
            .collect()
    }

    async fn lease(&self, thread_id: &str) -> ThreadLease {
        self.leases.acquire(thread_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;

    #[tokio::test]
    async fn save_load_and_list() {
        let store = SqliteCheckpointStore::in_memory().await.unwrap();
        let first = ConversationState::new("b").append([Message::user("hola")]);
        let second = first.append([Message::assistant("¡hola!")]);

        store.save(&first).await.unwrap();
        store.save(&second).await.unwrap();
        store
            .save(&ConversationState::new("a").append([Message::user("x")]))
            .await
            .unwrap();

        assert_eq!(store.load("b").await.unwrap(), Some(second));
        assert!(store.load("zzz").await.unwrap().is_none());
        assert_eq!(store.list_threads().await.unwrap(), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn rejects_snapshot_that_drops_history() {
        let store = SqliteCheckpointStore::in_memory().await.unwrap();
        let longer = ConversationState::new("t").append([Message::user("a"), Message::assistant("b")]);
        store.save(&longer).await.unwrap();

        let err = store
            .save(&ConversationState::new("t").append([Message::user("a")]))
            .await
            .unwrap_err();

        assert!(matches!(err, ThreadloopError::Checkpoint { .. }));
    }
}
