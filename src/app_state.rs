//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::TrackService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Track service for authentication, storage and live fan-out.
    pub track_service: Arc<TrackService>,
}
