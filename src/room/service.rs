use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use super::{
    models::{RoomModel, TrackModel},
    repository::RoomRepository,
};
use crate::shared::RoomError;

/// Default deadline for a single registry call
pub const DEFAULT_REGISTRY_TIMEOUT: Duration = Duration::from_secs(10);

/// Registry access for the rest of the server
///
/// Every call is bounded by the configured deadline and fails with
/// `RoomError::Timeout` instead of stalling the calling handler.
pub struct RoomService {
    repository: Arc<dyn RoomRepository + Send + Sync>,
    deadline: Duration,
}

impl RoomService {
    pub fn new(repository: Arc<dyn RoomRepository + Send + Sync>) -> Self {
        Self {
            repository,
            deadline: DEFAULT_REGISTRY_TIMEOUT,
        }
    }

    /// Set the deadline applied to each registry call
    pub fn with_timeout(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, RoomError>>,
    ) -> Result<T, RoomError> {
        match timeout(self.deadline, call).await {
            Ok(result) => result,
            Err(_elapsed) => {
                warn!(
                    operation = operation,
                    deadline_ms = self.deadline.as_millis() as u64,
                    "Registry call timed out"
                );
                Err(RoomError::Timeout(operation))
            }
        }
    }

    /// Creates a room; the registry assigns the id
    #[instrument(skip(self))]
    pub async fn create_room(&self, name: &str) -> Result<RoomModel, RoomError> {
        let room = self
            .bounded("create_room", self.repository.create_room(RoomModel::new(name)))
            .await?;
        info!(room_id = %room.id, name = %room.name, "Room created successfully");
        Ok(room)
    }

    #[instrument(skip(self))]
    pub async fn get_room(&self, room_id: &str) -> Result<Option<RoomModel>, RoomError> {
        debug!(room_id = %room_id, "Getting room model");
        self.bounded("get_room", self.repository.get_room(room_id))
            .await
    }

    /// Like `get_room`, but a missing room is an `UnknownRoom` error
    pub async fn require_room(&self, room_id: &str) -> Result<RoomModel, RoomError> {
        self.get_room(room_id)
            .await?
            .ok_or_else(|| RoomError::UnknownRoom(room_id.to_string()))
    }

    #[instrument(skip(self))]
    pub async fn list_rooms(&self) -> Result<Vec<RoomModel>, RoomError> {
        self.bounded("list_rooms", self.repository.list_rooms())
            .await
    }

    #[instrument(skip(self, room), fields(room_id = %room.id))]
    pub async fn update_room(&self, room: &RoomModel) -> Result<(), RoomError> {
        self.bounded("update_room", self.repository.update_room(room))
            .await
    }

    #[instrument(skip(self, track), fields(track_id = %track.id))]
    pub async fn add_track(&self, room_id: &str, track: TrackModel) -> Result<(), RoomError> {
        self.bounded("add_track", self.repository.add_track(room_id, track))
            .await
    }

    #[instrument(skip(self))]
    pub async fn list_tracks(&self, room_id: &str) -> Result<Vec<TrackModel>, RoomError> {
        self.bounded("list_tracks", self.repository.list_tracks(room_id))
            .await
    }

    #[instrument(skip(self))]
    pub async fn remove_track(&self, room_id: &str, track_id: &str) -> Result<bool, RoomError> {
        self.bounded(
            "remove_track",
            self.repository.remove_track(room_id, track_id),
        )
        .await
    }
}
