//! Domain layer: track update records, issued tokens, and live fan-out.
//!
//! This module contains the protobuf records exchanged with producers,
//! the payload delivered to live viewers, and the subscriber registry that
//! multicasts ingested updates to open connections.

pub mod subscriber_id;
pub mod subscriber_registry;
pub mod token;
pub mod track_update;

pub use subscriber_id::SubscriberId;
pub use subscriber_registry::{Delivery, SubscriberRegistry, Subscription};
pub use token::Token;
pub use track_update::{LiveUpdate, Track, TrackUpdate};
