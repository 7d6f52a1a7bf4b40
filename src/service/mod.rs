//! Service layer: business logic orchestration.
//!
//! [`TrackService`] ties the token authority, the persistent store and the
//! subscriber registry together. HTTP and WebSocket handlers delegate to it.

pub mod track_service;

pub use track_service::TrackService;
