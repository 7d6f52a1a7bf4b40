//! Track update handlers: ingest, session list, session read, delete.

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};

use super::{CONTENT_TYPE_PROTOBUF, TOKEN_HEADER, header_str};
use crate::api::dto::{SessionListResponse, SessionQuery, SessionUpdatesResponse, TrackUpdateDto};
use crate::api::export;
use crate::app_state::AppState;
use crate::domain::TrackUpdate;
use crate::error::{ErrorResponse, LiveError};

/// Largest accepted track update body, in bytes.
pub const MAX_UPDATE_BYTES: usize = 4096;

/// `POST /_trackUpdate/{user_id}/{started}`: Ingest one track update.
///
/// Authentication and framing are checked before the body is read; the
/// body is read only up to its declared length.
///
/// # Errors
///
/// - [`LiveError::AuthDenied`] / [`LiveError::Forbidden`] on a bad token
///   or a token for another user.
/// - [`LiveError::Malformed`], [`LiveError::NotAcceptable`],
///   [`LiveError::LengthRequired`], [`LiveError::PayloadTooLarge`] on bad
///   framing or payload.
/// - [`LiveError::Conflict`] / [`LiveError::StorageFailure`] if the update
///   cannot be stored.
#[utoipa::path(
    post,
    path = "/_trackUpdate/{user_id}/{started}",
    tag = "Track updates",
    summary = "Submit a track update",
    description = "Accepts a protobuf TrackUpdate of at most 4096 bytes for the session `started`, stores it and pushes it to live viewers.",
    params(
        ("user_id" = String, Path, description = "User the token was issued for"),
        ("started" = i64, Path, description = "Session start, epoch milliseconds"),
        ("x-extension-jwt" = String, Header, description = "Bearer token"),
    ),
    responses(
        (status = 200, description = "Update accepted"),
        (status = 400, description = "Malformed framing or payload", body = ErrorResponse),
        (status = 403, description = "Bad token or user mismatch", body = ErrorResponse),
        (status = 406, description = "Not application/protobuf", body = ErrorResponse),
        (status = 411, description = "Missing Content-Length", body = ErrorResponse),
        (status = 413, description = "Body larger than 4096 bytes", body = ErrorResponse),
        (status = 507, description = "Duplicate or storage failure", body = ErrorResponse),
    )
)]
pub async fn post_track_update(
    State(state): State<AppState>,
    Path((user_id, started)): Path<(String, String)>,
    headers: HeaderMap,
    body: Body,
) -> Result<StatusCode, LiveError> {
    let bearer = header_str(&headers, TOKEN_HEADER).unwrap_or_default();
    state.track_service.authorize(bearer, &user_id)?;

    let started = parse_started(&started)?;
    require_protobuf(&headers)?;
    let declared = declared_length(&headers)?;

    let bytes = axum::body::to_bytes(body, declared)
        .await
        .map_err(|e| LiveError::Malformed(format!("reading body: {e}")))?;
    if bytes.len() != declared {
        return Err(LiveError::Malformed(format!(
            "content-length {declared} does not match body length {}",
            bytes.len()
        )));
    }
    let update = TrackUpdate::decode_bytes(&bytes)
        .map_err(|e| LiveError::Malformed(format!("bad track update: {e}")))?;

    state.track_service.ingest(&user_id, started, update).await?;
    Ok(StatusCode::OK)
}

/// `GET /_trackUpdate/{user_id}`: List a user's sessions.
///
/// # Errors
///
/// Returns [`LiveError::Internal`] if the store fails.
#[utoipa::path(
    get,
    path = "/_trackUpdate/{user_id}",
    tag = "Track updates",
    summary = "List sessions",
    description = "Returns the distinct session start times of a user, newest first.",
    params(
        ("user_id" = String, Path, description = "User whose sessions to list"),
    ),
    responses(
        (status = 200, description = "Session start times", body = SessionListResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    )
)]
pub async fn list_sessions(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<SessionListResponse>, LiveError> {
    let sessions = state.track_service.list_sessions(&user_id).await?;
    Ok(Json(SessionListResponse { sessions }))
}

/// `GET /_trackUpdate/{user_id}/{started}`: Read one session.
///
/// # Errors
///
/// - [`LiveError::Malformed`] if `started` is not an integer.
/// - [`LiveError::Internal`] if the store fails or the export cannot be
///   rendered.
#[utoipa::path(
    get,
    path = "/_trackUpdate/{user_id}/{started}",
    tag = "Track updates",
    summary = "Get a session",
    description = "Returns a session's updates in index order, as JSON or, with `download=csv`, as a CSV attachment.",
    params(
        ("user_id" = String, Path, description = "Session owner"),
        ("started" = i64, Path, description = "Session start, epoch milliseconds"),
        SessionQuery,
    ),
    responses(
        (status = 200, description = "Session updates", body = SessionUpdatesResponse),
        (status = 400, description = "Invalid session start", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    )
)]
pub async fn get_session(
    State(state): State<AppState>,
    Path((user_id, started)): Path<(String, String)>,
    Query(query): Query<SessionQuery>,
) -> Result<Response, LiveError> {
    let started = parse_started(&started)?;
    let updates = state.track_service.get_session(&user_id, started).await?;

    if query.wants_csv() {
        let csv = export::session_csv(&updates)
            .map_err(|e| LiveError::Internal(format!("rendering csv: {e}")))?;
        let disposition = format!(
            "attachment; filename=\"{}\"",
            export::attachment_name(&user_id, started)
        );
        return Ok((
            [
                (CONTENT_TYPE, "text/csv".to_string()),
                (CONTENT_DISPOSITION, disposition),
            ],
            csv,
        )
            .into_response());
    }

    let updates = updates.iter().map(TrackUpdateDto::from).collect();
    Ok(Json(SessionUpdatesResponse { updates }).into_response())
}

/// `DELETE /_trackUpdate/{user_id}/{started}`: Delete a session.
///
/// Reserved: after authentication this always answers 501.
///
/// # Errors
///
/// - [`LiveError::AuthDenied`] / [`LiveError::Forbidden`] on a bad token.
/// - [`LiveError::NotImplemented`] otherwise.
#[utoipa::path(
    delete,
    path = "/_trackUpdate/{user_id}/{started}",
    tag = "Track updates",
    summary = "Delete a session (not implemented)",
    params(
        ("user_id" = String, Path, description = "Session owner"),
        ("started" = i64, Path, description = "Session start, epoch milliseconds"),
        ("x-extension-jwt" = String, Header, description = "Bearer token"),
    ),
    responses(
        (status = 403, description = "Bad token or user mismatch", body = ErrorResponse),
        (status = 501, description = "Deletion is not supported", body = ErrorResponse),
    )
)]
pub async fn delete_session(
    State(state): State<AppState>,
    Path((user_id, started)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<StatusCode, LiveError> {
    let bearer = header_str(&headers, TOKEN_HEADER).unwrap_or_default();
    state.track_service.authorize(bearer, &user_id)?;
    let started = parse_started(&started)?;
    state.track_service.delete_session(&user_id, started).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Track update routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/_trackUpdate/{user_id}", get(list_sessions))
        .route(
            "/_trackUpdate/{user_id}/{started}",
            get(get_session)
                .post(post_track_update)
                .delete(delete_session),
        )
}

fn parse_started(raw: &str) -> Result<i64, LiveError> {
    raw.parse()
        .map_err(|e| LiveError::Malformed(format!("parsing started {raw:?}: {e}")))
}

fn require_protobuf(headers: &HeaderMap) -> Result<(), LiveError> {
    let content_type = header_str(headers, CONTENT_TYPE.as_str()).unwrap_or_default();
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    if essence.eq_ignore_ascii_case(CONTENT_TYPE_PROTOBUF) {
        Ok(())
    } else {
        Err(LiveError::NotAcceptable(content_type.to_string()))
    }
}

/// Validates the declared body length against [`MAX_UPDATE_BYTES`].
fn declared_length(headers: &HeaderMap) -> Result<usize, LiveError> {
    let Some(raw) = headers.get(CONTENT_LENGTH) else {
        return Err(LiveError::LengthRequired);
    };
    let declared = raw
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|&n| n >= 1)
        .ok_or_else(|| LiveError::Malformed("bad content-length".to_string()))?;
    if declared > MAX_UPDATE_BYTES {
        return Err(LiveError::PayloadTooLarge {
            declared,
            limit: MAX_UPDATE_BYTES,
        });
    }
    Ok(declared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn with_length(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn missing_length_is_required() {
        assert!(matches!(
            declared_length(&HeaderMap::new()),
            Err(LiveError::LengthRequired)
        ));
    }

    #[test]
    fn invalid_length_is_malformed() {
        for value in ["abc", "0", "-1", ""] {
            assert!(
                matches!(declared_length(&with_length(value)), Err(LiveError::Malformed(_))),
                "{value:?} should be malformed"
            );
        }
    }

    #[test]
    fn length_bound_is_inclusive() {
        assert!(matches!(declared_length(&with_length("4096")), Ok(4096)));
        assert!(matches!(
            declared_length(&with_length("4097")),
            Err(LiveError::PayloadTooLarge { declared: 4097, .. })
        ));
    }

    #[test]
    fn content_type_must_be_protobuf() {
        let mut headers = HeaderMap::new();
        assert!(matches!(
            require_protobuf(&headers),
            Err(LiveError::NotAcceptable(_))
        ));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert!(require_protobuf(&headers).is_err());
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/protobuf; charset=binary"),
        );
        assert!(require_protobuf(&headers).is_ok());
    }

    #[test]
    fn started_must_be_integer() {
        assert!(matches!(parse_started("1000000"), Ok(1_000_000)));
        assert!(matches!(parse_started("-5"), Ok(-5)));
        assert!(matches!(parse_started("soon"), Err(LiveError::Malformed(_))));
    }
}
