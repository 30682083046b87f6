use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::event::EventDispatcher;
use crate::playback::PlaybackService;
use crate::room::service::RoomService;
use crate::websockets::{controllers, ConnectionHub};

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub room_service: Arc<RoomService>,
    pub hub: Arc<ConnectionHub>,
    pub playback: Arc<PlaybackService>,
    pub dispatcher: Arc<EventDispatcher>,
}

impl AppState {
    /// Builds the hub, the playback service and a dispatcher with every
    /// controller bound. One instance per process; tests build their own.
    pub fn new(room_service: Arc<RoomService>) -> Self {
        let hub = Arc::new(ConnectionHub::new(Arc::clone(&room_service)));
        let playback = Arc::new(PlaybackService::new(Arc::clone(&room_service), Arc::clone(&hub)));
        let mut dispatcher = EventDispatcher::new(Arc::clone(&playback));
        controllers::bind_controllers(&mut dispatcher);

        Self {
            room_service,
            hub,
            playback,
            dispatcher: Arc::new(dispatcher),
        }
    }
}

/// Errors raised by the room coordination core
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoomError {
    #[error("Unknown room: {0}")]
    UnknownRoom(String),

    #[error("{member_id} is not a member of {}", .room_id.as_deref().unwrap_or("any room"))]
    NotAMember {
        member_id: String,
        room_id: Option<String>,
    },

    #[error("Registry call timed out: {0}")]
    Timeout(&'static str),

    #[error("No handler bound for event: {0}")]
    Dropped(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Registry error: {0}")]
    Registry(String),
}

impl RoomError {
    pub fn not_a_member(member_id: impl Into<String>, room_id: Option<&str>) -> Self {
        RoomError::NotAMember {
            member_id: member_id.into(),
            room_id: room_id.map(str::to_string),
        }
    }

    /// Stable machine-readable name, sent to clients alongside the message
    pub fn kind(&self) -> &'static str {
        match self {
            RoomError::UnknownRoom(_) => "unknownRoom",
            RoomError::NotAMember { .. } => "notAMember",
            RoomError::Timeout(_) => "timeout",
            RoomError::Dropped(_) => "dropped",
            RoomError::InvalidPayload(_) => "invalidPayload",
            RoomError::Registry(_) => "registry",
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream timeout: {0}")]
    Timeout(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<RoomError> for AppError {
    fn from(err: RoomError) -> Self {
        match err {
            RoomError::UnknownRoom(_) => AppError::NotFound(err.to_string()),
            RoomError::InvalidPayload(_) => AppError::BadRequest(err.to_string()),
            RoomError::Timeout(_) => AppError::Timeout(err.to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Timeout(msg) => (StatusCode::GATEWAY_TIMEOUT, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
pub mod test_utils {
    use super::*;
    use crate::room::models::{RoomModel, TrackModel};
    use crate::room::repository::{InMemoryRoomRepository, RoomRepository};
    use async_trait::async_trait;
    use std::time::Duration;

    /// Room service over a fresh in-memory registry
    pub fn room_service() -> Arc<RoomService> {
        Arc::new(RoomService::new(Arc::new(InMemoryRoomRepository::new())))
    }

    /// In-memory registry whose room reads lag, widening any check-then-act window
    pub struct SlowRoomRepository {
        inner: InMemoryRoomRepository,
        delay: Duration,
    }

    impl SlowRoomRepository {
        pub fn new(delay: Duration) -> Self {
            Self {
                inner: InMemoryRoomRepository::new(),
                delay,
            }
        }
    }

    #[async_trait]
    impl RoomRepository for SlowRoomRepository {
        async fn create_room(&self, room: RoomModel) -> Result<RoomModel, RoomError> {
            self.inner.create_room(room).await
        }
        async fn get_room(&self, room_id: &str) -> Result<Option<RoomModel>, RoomError> {
            tokio::time::sleep(self.delay).await;
            self.inner.get_room(room_id).await
        }
        async fn list_rooms(&self) -> Result<Vec<RoomModel>, RoomError> {
            self.inner.list_rooms().await
        }
        async fn update_room(&self, room: &RoomModel) -> Result<(), RoomError> {
            self.inner.update_room(room).await
        }
        async fn add_track(&self, room_id: &str, track: TrackModel) -> Result<(), RoomError> {
            self.inner.add_track(room_id, track).await
        }
        async fn list_tracks(&self, room_id: &str) -> Result<Vec<TrackModel>, RoomError> {
            tokio::time::sleep(self.delay).await;
            self.inner.list_tracks(room_id).await
        }
        async fn remove_track(&self, room_id: &str, track_id: &str) -> Result<bool, RoomError> {
            self.inner.remove_track(room_id, track_id).await
        }
    }

    /// Registry that never answers within any sensible deadline
    pub struct StalledRoomRepository;

    impl StalledRoomRepository {
        async fn stall() {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
    }

    #[async_trait]
    impl RoomRepository for StalledRoomRepository {
        async fn create_room(&self, room: RoomModel) -> Result<RoomModel, RoomError> {
            Self::stall().await;
            Ok(room)
        }
        async fn get_room(&self, _room_id: &str) -> Result<Option<RoomModel>, RoomError> {
            Self::stall().await;
            Ok(None)
        }
        async fn list_rooms(&self) -> Result<Vec<RoomModel>, RoomError> {
            Self::stall().await;
            Ok(Vec::new())
        }
        async fn update_room(&self, _room: &RoomModel) -> Result<(), RoomError> {
            Self::stall().await;
            Ok(())
        }
        async fn add_track(&self, _room_id: &str, _track: TrackModel) -> Result<(), RoomError> {
            Self::stall().await;
            Ok(())
        }
        async fn list_tracks(&self, _room_id: &str) -> Result<Vec<TrackModel>, RoomError> {
            Self::stall().await;
            Ok(Vec::new())
        }
        async fn remove_track(&self, _room_id: &str, _track_id: &str) -> Result<bool, RoomError> {
            Self::stall().await;
            Ok(false)
        }
    }
}
