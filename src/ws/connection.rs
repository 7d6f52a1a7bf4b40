//! Live stream connection loop.
//!
//! Forwards every update published for the connection's user until the
//! client goes away or the registry shuts down. Client messages are read
//! only to notice disconnects.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};

use super::messages;
use crate::domain::Subscription;

/// Runs the read/write loop for a single live connection.
///
/// Owns `subscription` for the connection's whole lifetime; dropping it on
/// return deregisters the viewer on every exit path.
pub async fn run_connection(socket: WebSocket, mut subscription: Subscription) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            // Incoming message from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        tracing::debug!(error = %err, "live stream read failed");
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
            // Update from the subscriber registry
            update = subscription.recv() => {
                let Some(update) = update else {
                    // unsubscribed or shutting down
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break;
                };
                let text = match messages::encode(&update) {
                    Ok(text) => text,
                    Err(err) => {
                        tracing::warn!(error = %err, "encoding live update");
                        continue;
                    }
                };
                tracing::debug!(
                    user_id = %update.user_id,
                    started = update.started,
                    idx = update.update.index,
                    "sending track update to viewer"
                );
                if ws_tx.send(Message::text(text)).await.is_err() {
                    break;
                }
            }
        }
    }

    tracing::debug!(
        user_id = subscription.user_id(),
        subscriber = %subscription.id(),
        "live stream closed"
    );
}
