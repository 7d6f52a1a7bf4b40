//! Token issuance handler.

use axum::Router;
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, State};
use axum::http::HeaderMap;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use prost::Message;

use super::{CONTENT_TYPE_PROTOBUF, TOKEN_HEADER, header_str};
use crate::api::dto::IssueForm;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, LiveError};

/// `POST /_issue`: Mint a bearer token for a user.
///
/// The admin key is presented in the `x-extension-jwt` header.
///
/// # Errors
///
/// - [`LiveError::Malformed`] if the header or `user_id` is missing.
/// - [`LiveError::AuthDenied`] if the admin key is wrong.
#[utoipa::path(
    post,
    path = "/_issue",
    tag = "Tokens",
    summary = "Issue a producer token",
    description = "Mints a long-lived bearer token scoped to `user_id`. The response body is a protobuf Token record.",
    request_body(content = IssueForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Protobuf-encoded token"),
        (status = 400, description = "Missing header or user_id", body = ErrorResponse),
        (status = 403, description = "Bad admin key", body = ErrorResponse),
    )
)]
pub async fn issue_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: Result<Form<IssueForm>, FormRejection>,
) -> Result<Response, LiveError> {
    let Some(presented_key) = header_str(&headers, TOKEN_HEADER) else {
        return Err(LiveError::Malformed(format!("required header: {TOKEN_HEADER}")));
    };
    let user_id = form
        .ok()
        .and_then(|Form(f)| f.user_id)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| LiveError::Malformed("required param: user_id".to_string()))?;

    let token = state.track_service.issue(presented_key, &user_id)?;

    Ok(([(CONTENT_TYPE, CONTENT_TYPE_PROTOBUF)], token.encode_to_vec()).into_response())
}

/// Token issuance routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/_issue", post(issue_token))
}
