//! Axum WebSocket upgrade handler.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, State};
use axum::response::IntoResponse;

use super::connection::run_connection;
use crate::app_state::AppState;

/// `GET /_sub/{user_id}`: Upgrade to a live stream of `user_id`'s updates.
///
/// The viewer is registered before the upgrade completes, so nothing
/// published after the handshake is missed. If the upgrade fails the
/// registration is dropped with the callback.
pub async fn live_stream(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    let subscription = state.track_service.subscribe(&user_id);
    tracing::debug!(user_id = %user_id, subscriber = %subscription.id(), "live stream opened");

    ws.on_upgrade(move |socket| run_connection(socket, subscription))
}
