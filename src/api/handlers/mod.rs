//! REST endpoint handlers organized by resource.

pub mod issue;
pub mod system;
pub mod track_update;

use axum::Router;
use axum::http::HeaderMap;

use crate::app_state::AppState;

/// Header carrying the admin key on `/_issue` and the bearer token
/// everywhere else.
pub const TOKEN_HEADER: &str = "x-extension-jwt";

/// Media type of protobuf request and response bodies.
pub const CONTENT_TYPE_PROTOBUF: &str = "application/protobuf";

/// Composes all resource routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(issue::routes())
        .merge(track_update::routes())
        .merge(system::routes())
}

/// Returns a non-empty, visible-ASCII header value.
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}
