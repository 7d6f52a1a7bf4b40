//! WebSocket layer: live stream upgrade, connection loop, frames.
//!
//! The endpoint at `/_sub/{user_id}` is push-only: the server sends one
//! JSON text frame per ingested update and ignores client messages.

pub mod connection;
pub mod handler;
pub mod messages;
