//! SQLite implementation of the persistence layer.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use super::models::StoredTrackUpdate;
use super::{StoreError, TrackStore};
use crate::domain::TrackUpdate;

/// Value of `PRAGMA user_version` once [`SCHEMA_V1`] has been applied.
const SCHEMA_VERSION: i64 = 1;

const SCHEMA_V1: &str = r"
CREATE TABLE track_updates (
    user_id      TEXT,
    started      INT,
    deck_id      TEXT,
    artist       TEXT,
    title        TEXT,
    played_when  INT,
    idx          INT
);

-- most lookups are by user+session
CREATE INDEX session ON track_updates (user_id, started);

CREATE UNIQUE INDEX unique_updates ON track_updates (user_id, started, played_when);

PRAGMA user_version = 1;
";

/// SQLite-backed [`TrackStore`] using `sqlx::SqlitePool`.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if missing) the database at `url` and initializes
    /// the schema on first use.
    ///
    /// `sqlite::memory:` databases are private to one connection, so they
    /// need `max_connections == 1`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the URL is invalid, the database
    /// cannot be opened, or schema initialization fails.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self::new(pool);
        store.init().await?;
        Ok(store)
    }

    /// Wraps an existing pool. The schema is not touched; call
    /// [`SqliteStore::init`] before use.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Applies the schema unless `PRAGMA user_version` says it already has
    /// been.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on database failure.
    pub async fn init(&self) -> Result<(), StoreError> {
        let version: i64 = sqlx::query_scalar("PRAGMA user_version")
            .fetch_one(&self.pool)
            .await?;
        if version != SCHEMA_VERSION {
            sqlx::raw_sql(SCHEMA_V1).execute(&self.pool).await?;
            tracing::info!(version = SCHEMA_VERSION, "initialized database schema");
        }
        Ok(())
    }
}

#[async_trait]
impl TrackStore for SqliteStore {
    async fn list_sessions(&self, user_id: &str) -> Result<Vec<i64>, StoreError> {
        let sessions = sqlx::query_scalar::<_, i64>(
            "SELECT DISTINCT started FROM track_updates \
             WHERE user_id = ? ORDER BY started DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(sessions)
    }

    async fn get_session(
        &self,
        user_id: &str,
        started: i64,
    ) -> Result<Vec<TrackUpdate>, StoreError> {
        let rows = sqlx::query_as::<_, StoredTrackUpdate>(
            "SELECT deck_id, artist, title, played_when, idx FROM track_updates \
             WHERE user_id = ? AND started = ? ORDER BY idx ASC",
        )
        .bind(user_id)
        .bind(started)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(TrackUpdate::from).collect())
    }

    async fn append_update(
        &self,
        user_id: &str,
        started: i64,
        update: &TrackUpdate,
    ) -> Result<(), StoreError> {
        let row = StoredTrackUpdate::from(update);
        sqlx::query(
            "INSERT INTO track_updates \
             (user_id, started, deck_id, artist, title, played_when, idx) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(started)
        .bind(row.deck_id)
        .bind(row.artist)
        .bind(row.title)
        .bind(row.played_when)
        .bind(row.idx)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_session(&self, _user_id: &str, _started: i64) -> Result<(), StoreError> {
        Err(StoreError::NotImplemented)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
