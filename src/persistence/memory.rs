//! In-memory [`TrackStore`] used by tests and local experiments.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{StoreError, TrackStore};
use crate::domain::TrackUpdate;

/// Non-durable store with the same uniqueness rule as the SQLite schema.
#[derive(Debug, Default)]
pub struct MemoryStore {
    // user -> started -> updates in arrival order
    sessions: Mutex<HashMap<String, BTreeMap<i64, Vec<TrackUpdate>>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of stored updates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .values()
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum()
    }

    /// Returns `true` if nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TrackStore for MemoryStore {
    async fn list_sessions(&self, user_id: &str) -> Result<Vec<i64>, StoreError> {
        let sessions = self.sessions.lock();
        Ok(sessions
            .get(user_id)
            .map(|by_start| by_start.keys().rev().copied().collect())
            .unwrap_or_default())
    }

    async fn get_session(
        &self,
        user_id: &str,
        started: i64,
    ) -> Result<Vec<TrackUpdate>, StoreError> {
        let sessions = self.sessions.lock();
        let mut updates = sessions
            .get(user_id)
            .and_then(|by_start| by_start.get(&started))
            .cloned()
            .unwrap_or_default();
        updates.sort_by_key(|u| u.index);
        Ok(updates)
    }

    async fn append_update(
        &self,
        user_id: &str,
        started: i64,
        update: &TrackUpdate,
    ) -> Result<(), StoreError> {
        let mut sessions = self.sessions.lock();
        let session = sessions
            .entry(user_id.to_string())
            .or_default()
            .entry(started)
            .or_default();
        if session.iter().any(|u| u.when == update.when) {
            return Err(StoreError::Conflict);
        }
        session.push(update.clone());
        Ok(())
    }

    async fn delete_session(&self, _user_id: &str, _started: i64) -> Result<(), StoreError> {
        Err(StoreError::NotImplemented)
    }
}
