//! # trackstar-live
//!
//! Backend for a "now playing" broadcast: producers post one track update
//! per song change, the service records it durably, and every viewer with
//! an open live connection sees it immediately.
//!
//! ## Architecture
//!
//! ```text
//! Producer (HTTP, protobuf)        Viewers (WebSocket, JSON)
//!     │                                 ▲
//!     ├── REST Handlers (api/)          ├── Live stream (ws/)
//!     │                                 │
//!     ├── TrackService (service/) ──────┤
//!     │       │                         │
//!     │       ├── TokenAuthority (auth/)
//!     │       ├── SubscriberRegistry (domain/)
//!     │       └── TrackStore (persistence/)
//!     │
//!     └── SQLite
//! ```

pub mod api;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod ws;
