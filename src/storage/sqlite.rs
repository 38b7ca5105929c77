use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use super::{
    StateStore, Version, Versioned, MIGRATION_001_WORLD_STATE, MIGRATION_002_IDENTITIES,
};

/// SQLite-backed world state. Each key maps to exactly one row.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new store with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations. Safe to run more than once.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_WORLD_STATE)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;

        sqlx::query(MIGRATION_002_IDENTITIES)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 002")?;

        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let store = Self::connect(database_url).await?;
        store.migrate().await?;
        Ok(store)
    }

    /// Create (if needed) and migrate the database file at `path`.
    pub async fn init_path(path: &str) -> Result<Self> {
        Self::init(&format!("sqlite:{}?mode=rwc", path)).await
    }

    /// Open an existing database file at `path`.
    pub async fn connect_path(path: &str) -> Result<Self> {
        Self::connect(&format!("sqlite:{}", path)).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl StateStore for SqliteStore {
    async fn get_versioned(&self, key: &str) -> Result<Option<Versioned>> {
        let row = sqlx::query("SELECT value, version FROM world_state WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to read state for {}", key))?;

        Ok(row.map(|row| Versioned {
            value: row.get("value"),
            version: row.get("version"),
        }))
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO world_state (key, value, version, updated_at)
            VALUES (?, ?, 1, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                version = world_state.version + 1,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to write state for {}", key))?;

        tracing::trace!(key, bytes = value.len(), "state written");
        Ok(())
    }

    async fn put_if_version(&self, key: &str, value: &[u8], expected: Version) -> Result<bool> {
        // Single statement, so the version check and the write cannot be
        // split by another connection.
        let result = sqlx::query(
            r#"
            UPDATE world_state
            SET value = ?, version = version + 1, updated_at = ?
            WHERE key = ? AND version = ?
            "#,
        )
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .bind(key)
        .bind(expected)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to write state for {}", key))?;

        let written = result.rows_affected() == 1;
        tracing::trace!(key, expected, written, "conditional state write");
        Ok(written)
    }
}
