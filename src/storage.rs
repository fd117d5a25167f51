use crate::widget_config::SavedDashboard;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Storage key for the ordered list of saved dashboards.
pub const DASHBOARDS_KEY: &str = "savedDashboards";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Durable local key-value store, JSON values in a SQLite table.
///
/// This is the engine's equivalent of browser local storage: single-user,
/// single-writer, no merge semantics (last save wins). Values that fail to
/// parse on read are treated as absent so a corrupt entry can never
/// propagate a parse error into the render path.
pub struct LocalStore {
    pool: SqlitePool,
}

impl LocalStore {
    /// Opens (or creates) the store at the given file path.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await?;
        info!("Opened local store at {}", path.as_ref().display());
        Self::init(pool).await
    }

    /// In-memory store for tests and ephemeral sessions.
    ///
    /// A single connection keeps every caller on the same memory database.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::init(pool).await
    }

    async fn init(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;
        Ok(Self { pool })
    }

    /// Reads and deserializes a value.
    ///
    /// An unparsable stored value is logged and reported as `None` — the
    /// caller fails safe to its default state instead of seeing an error.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let row = sqlx::query("SELECT value FROM kv WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else { return Ok(None) };
        let raw: String = row.get("value");
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("Discarding corrupt value for key {key}: {e}");
                Ok(None)
            }
        }
    }

    /// Raw stored JSON text for a key, without deserialization.
    pub async fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        let row = sqlx::query("SELECT value FROM kv WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get("value")))
    }

    /// Serializes and upserts a value.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value)?;
        sqlx::query(
            r#"
            INSERT INTO kv (key, value, updated_at)
            VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(raw)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM kv WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// The ordered list of saved dashboards. A missing or corrupt entry
    /// reads back as an empty list.
    pub async fn load_dashboards(&self) -> Result<Vec<SavedDashboard>, StoreError> {
        Ok(self.get(DASHBOARDS_KEY).await?.unwrap_or_default())
    }

    pub async fn save_dashboards(&self, dashboards: &[SavedDashboard]) -> Result<(), StoreError> {
        self.set(DASHBOARDS_KEY, &dashboards).await
    }
}
