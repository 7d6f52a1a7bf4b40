//! Persistence layer: durable track update history.
//!
//! [`TrackStore`] is the narrow capability the service depends on. The
//! production implementation is [`sqlite::SqliteStore`]; tests use
//! [`memory::MemoryStore`]. Both enforce the same uniqueness rule: one
//! row per `(user_id, started, when)`.

pub mod memory;
pub mod models;
pub mod sqlite;

use async_trait::async_trait;

use crate::domain::TrackUpdate;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Storage failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An update with the same `(user_id, started, when)` already exists.
    #[error("duplicate track update")]
    Conflict,

    /// The operation is reserved but not supported.
    #[error("not implemented")]
    NotImplemented,

    /// The storage engine failed.
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => Self::Conflict,
            _ => Self::Database(err),
        }
    }
}

/// Durable, queryable record of track updates keyed by user and session.
#[async_trait]
pub trait TrackStore: Send + Sync + std::fmt::Debug {
    /// Returns the distinct session start times for `user_id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on engine failure.
    async fn list_sessions(&self, user_id: &str) -> Result<Vec<i64>, StoreError>;

    /// Returns the updates of one session ordered by ascending index.
    ///
    /// An unknown session yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on engine failure.
    async fn get_session(&self, user_id: &str, started: i64)
    -> Result<Vec<TrackUpdate>, StoreError>;

    /// Appends one update to a session.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] if the session already holds an
    /// update with the same `when`, or [`StoreError::Database`] on engine
    /// failure.
    async fn append_update(
        &self,
        user_id: &str,
        started: i64,
        update: &TrackUpdate,
    ) -> Result<(), StoreError>;

    /// Deletes a session. Reserved.
    ///
    /// # Errors
    ///
    /// Always returns [`StoreError::NotImplemented`].
    async fn delete_session(&self, user_id: &str, started: i64) -> Result<(), StoreError>;

    /// Releases the underlying storage handle.
    async fn close(&self) {}
}
