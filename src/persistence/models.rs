//! Database row models.

use crate::domain::{Track, TrackUpdate};

/// One row of the `track_updates` table, minus the session key.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct StoredTrackUpdate {
    /// Deck the track was played on.
    pub deck_id: String,
    /// Performing artist.
    pub artist: String,
    /// Song title.
    pub title: String,
    /// Producer-supplied play timestamp.
    pub played_when: i64,
    /// Position within the session.
    pub idx: i32,
}

impl From<StoredTrackUpdate> for TrackUpdate {
    fn from(row: StoredTrackUpdate) -> Self {
        Self {
            deck_id: row.deck_id,
            track: Some(Track {
                artist: row.artist,
                title: row.title,
            }),
            when: row.played_when,
            index: row.idx,
        }
    }
}

impl From<&TrackUpdate> for StoredTrackUpdate {
    fn from(update: &TrackUpdate) -> Self {
        Self {
            deck_id: update.deck_id.clone(),
            artist: update.artist().to_string(),
            title: update.title().to_string(),
            played_when: update.when,
            idx: update.index,
        }
    }
}
