// Library crate for the jukebox room server
// This file exposes the public API for integration tests

pub mod config;
pub mod event;
pub mod playback;
pub mod room;
pub mod routes;
pub mod shared;
pub mod websockets;

// Re-export commonly used types for easier access in tests
pub use config::AppConfig;
pub use event::{DispatchOutcome, EventDispatcher, Handler};
pub use playback::{select_next_track, PlaybackService, SkipVoteTally};
pub use room::{models::RoomModel, models::TrackModel, repository::RoomRepository, service::RoomService};
pub use shared::{AppError, AppState, RoomError};
pub use websockets::{ConnectionHandle, ConnectionHub, EventTag, WebSocketMessage};
