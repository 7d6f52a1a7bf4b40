//! Track update records and the live fan-out payload.
//!
//! [`TrackUpdate`] and [`Track`] are the protobuf messages posted by a
//! producer on every song change. They are decoded once at ingestion and
//! are immutable afterwards. Within a session, updates are ordered by their
//! explicit [`TrackUpdate::index`], never by arrival order or timestamp.

use prost::Message;

/// Artist and title of a played song.
#[derive(Clone, PartialEq, Eq, Message)]
pub struct Track {
    /// Performing artist.
    #[prost(string, tag = "1")]
    pub artist: String,
    /// Song title.
    #[prost(string, tag = "2")]
    pub title: String,
}

/// One song-change event as submitted by a producer.
#[derive(Clone, PartialEq, Eq, Message)]
pub struct TrackUpdate {
    /// Identifier of the deck the track was played on.
    #[prost(string, tag = "1")]
    pub deck_id: String,
    /// The track itself. Absent tracks are stored with empty artist/title.
    #[prost(message, optional, tag = "2")]
    pub track: Option<Track>,
    /// Producer-supplied play timestamp. Part of the session uniqueness key.
    #[prost(int64, tag = "3")]
    pub when: i64,
    /// Explicit position of this update within its session.
    #[prost(int32, tag = "4")]
    pub index: i32,
}

impl TrackUpdate {
    /// Builds an update from its flattened fields.
    #[must_use]
    pub fn new(
        deck_id: impl Into<String>,
        artist: impl Into<String>,
        title: impl Into<String>,
        when: i64,
        index: i32,
    ) -> Self {
        Self {
            deck_id: deck_id.into(),
            track: Some(Track {
                artist: artist.into(),
                title: title.into(),
            }),
            when,
            index,
        }
    }

    /// Decodes a protobuf-encoded update.
    ///
    /// # Errors
    ///
    /// Returns a [`prost::DecodeError`] if `bytes` is not a valid message.
    pub fn decode_bytes(bytes: &[u8]) -> Result<Self, prost::DecodeError> {
        Self::decode(bytes)
    }

    /// Returns the artist, or `""` when no track is attached.
    #[must_use]
    pub fn artist(&self) -> &str {
        self.track.as_ref().map_or("", |t| t.artist.as_str())
    }

    /// Returns the title, or `""` when no track is attached.
    #[must_use]
    pub fn title(&self) -> &str {
        self.track.as_ref().map_or("", |t| t.title.as_str())
    }
}

/// A freshly ingested update, addressed to the viewers of one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveUpdate {
    /// Owner of the session.
    pub user_id: String,
    /// Session start, in epoch milliseconds.
    pub started: i64,
    /// The ingested update.
    pub update: TrackUpdate,
}
