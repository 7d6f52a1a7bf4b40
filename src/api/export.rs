//! CSV export of a session's track list.

use chrono::{DateTime, SecondsFormat};

use crate::domain::TrackUpdate;

/// Header row of every export.
pub const CSV_HEADER: [&str; 5] = ["index", "when", "deck ID", "artist", "title"];

/// Renders `updates` as CSV, one row per update in the given order.
///
/// `when` is rendered as an RFC 3339 UTC timestamp, reading the stored
/// value as epoch seconds.
///
/// # Errors
///
/// Returns a [`csv::Error`] if a record cannot be written.
pub fn session_csv(updates: &[TrackUpdate]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    for update in updates {
        writer.write_record([
            update.index.to_string().as_str(),
            format_when(update.when).as_str(),
            update.deck_id.as_str(),
            update.artist(),
            update.title(),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

/// Returns the download file name: `{user_id}-{YYYY-MM-DD}.csv`, dated by
/// the session start in UTC.
///
/// Characters outside `[A-Za-z0-9._-]` in the user ID are replaced so the
/// name is always a valid header value.
#[must_use]
pub fn attachment_name(user_id: &str, started: i64) -> String {
    let user: String = user_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let date = DateTime::from_timestamp_millis(started)
        .map_or_else(|| started.to_string(), |t| t.format("%Y-%m-%d").to_string());
    format!("{user}-{date}.csv")
}

fn format_when(when: i64) -> String {
    DateTime::from_timestamp(when, 0).map_or_else(
        || when.to_string(),
        |t| t.to_rfc3339_opts(SecondsFormat::Secs, true),
    )
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn renders_header_and_rows() {
        let updates = [
            TrackUpdate::new("d1", "Artist, The", "Song \"One\"", 0, 0),
            TrackUpdate::new("d2", "B", "Two", 86_400, 1),
        ];
        let Ok(bytes) = session_csv(&updates) else {
            panic!("rendering csv");
        };
        let Ok(text) = String::from_utf8(bytes) else {
            panic!("csv is utf-8");
        };
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "index,when,deck ID,artist,title",
                "0,1970-01-01T00:00:00Z,d1,\"Artist, The\",\"Song \"\"One\"\"\"",
                "1,1970-01-02T00:00:00Z,d2,B,Two",
            ]
        );
    }

    #[test]
    fn empty_session_has_only_header() {
        let Ok(bytes) = session_csv(&[]) else {
            panic!("rendering csv");
        };
        assert_eq!(bytes, b"index,when,deck ID,artist,title\n");
    }

    #[test]
    fn attachment_name_is_dated_and_sanitized() {
        assert_eq!(
            attachment_name("alice", 1_700_000_000_000),
            "alice-2023-11-14.csv"
        );
        assert_eq!(attachment_name("a\"b c", 0), "a_b_c-1970-01-01.csv");
    }
}
