//! Session history request/response types.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::TrackUpdate;

/// Artist and title of a played song.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TrackDto {
    /// Performing artist.
    pub artist: String,
    /// Song title.
    pub title: String,
}

/// JSON form of one track update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackUpdateDto {
    /// Deck the track was played on.
    #[serde(default)]
    pub deck_id: String,
    /// Played track; omitted when the producer sent none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<TrackDto>,
    /// Producer-supplied play timestamp.
    #[serde(default)]
    pub when: i64,
    /// Position within the session.
    #[serde(default)]
    pub index: i32,
}

impl From<&TrackUpdate> for TrackUpdateDto {
    fn from(update: &TrackUpdate) -> Self {
        Self {
            deck_id: update.deck_id.clone(),
            track: update.track.as_ref().map(|t| TrackDto {
                artist: t.artist.clone(),
                title: t.title.clone(),
            }),
            when: update.when,
            index: update.index,
        }
    }
}

/// `GET /_trackUpdate/{user_id}` response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionListResponse {
    /// Session start times in epoch milliseconds, newest first.
    pub sessions: Vec<i64>,
}

/// `GET /_trackUpdate/{user_id}/{started}` JSON response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionUpdatesResponse {
    /// Updates in index order.
    pub updates: Vec<TrackUpdateDto>,
}

/// Query parameters of the session read endpoint.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SessionQuery {
    /// `csv` returns a CSV attachment instead of JSON.
    pub download: Option<String>,
}

impl SessionQuery {
    /// Returns `true` if a CSV export was requested.
    #[must_use]
    pub fn wants_csv(&self) -> bool {
        self.download.as_deref() == Some("csv")
    }
}

/// `POST /_issue` form body.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct IssueForm {
    /// User ID the token will be scoped to.
    #[serde(default)]
    pub user_id: Option<String>,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn update_json_uses_camel_case() {
        let dto = TrackUpdateDto::from(&TrackUpdate::new("d1", "A", "B", 1_000_005, 2));
        let Ok(json) = serde_json::to_value(&dto) else {
            panic!("serializing");
        };
        assert_eq!(
            json,
            serde_json::json!({
                "deckId": "d1",
                "track": {"artist": "A", "title": "B"},
                "when": 1_000_005,
                "index": 2,
            })
        );
    }

    #[test]
    fn absent_track_is_omitted() {
        let update = TrackUpdate {
            deck_id: String::new(),
            track: None,
            when: 1,
            index: 0,
        };
        let Ok(json) = serde_json::to_value(TrackUpdateDto::from(&update)) else {
            panic!("serializing");
        };
        assert!(json.get("track").is_none());
    }

    #[test]
    fn only_csv_selects_export() {
        let csv = SessionQuery {
            download: Some("csv".to_string()),
        };
        let other = SessionQuery {
            download: Some("xlsx".to_string()),
        };
        assert!(csv.wants_csv());
        assert!(!other.wants_csv());
        assert!(!SessionQuery::default().wants_csv());
    }
}
