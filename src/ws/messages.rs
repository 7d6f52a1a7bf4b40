//! Messages pushed to live viewers.

use serde::{Deserialize, Serialize};

use crate::api::dto::TrackUpdateDto;
use crate::domain::LiveUpdate;

/// One pushed update, sent as a JSON text frame.
///
/// ```json
/// {"user_id": "alice", "started": 1000000, "update": {"deckId": "d1", ...}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveUpdateMessage {
    /// Owner of the session.
    pub user_id: String,
    /// Session start, in epoch milliseconds.
    pub started: i64,
    /// The update itself.
    pub update: TrackUpdateDto,
}

impl From<&LiveUpdate> for LiveUpdateMessage {
    fn from(live: &LiveUpdate) -> Self {
        Self {
            user_id: live.user_id.clone(),
            started: live.started,
            update: TrackUpdateDto::from(&live.update),
        }
    }
}

/// Serializes `live` into the text frame sent to viewers.
///
/// # Errors
///
/// Returns a [`serde_json::Error`] if serialization fails.
pub fn encode(live: &LiveUpdate) -> Result<String, serde_json::Error> {
    serde_json::to_string(&LiveUpdateMessage::from(live))
}
