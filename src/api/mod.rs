//! Data source clients
//!
//! - firebase: Realtime Database REST + streaming client
//! - events: event-stream framing and the live tree copy

pub mod events;
pub mod firebase;

pub use events::{EventParser, LiveTree, SseFrame, TreeEvent};
pub use firebase::{FirebaseClient, FirebaseError};
