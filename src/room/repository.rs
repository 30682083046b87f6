use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::models::{RoomModel, TrackModel};
use crate::shared::RoomError;

/// Trait for the room/playlist registry
///
/// Implementations serialize their own writes per key; callers must not rely on
/// any atomicity spanning more than one call.
#[async_trait]
pub trait RoomRepository {
    /// Stores a new room under a freshly assigned id and returns it with the id set.
    /// Id assignment is atomic: concurrent creations never share an id.
    async fn create_room(&self, room: RoomModel) -> Result<RoomModel, RoomError>;
    async fn get_room(&self, room_id: &str) -> Result<Option<RoomModel>, RoomError>;
    async fn list_rooms(&self) -> Result<Vec<RoomModel>, RoomError>;
    async fn update_room(&self, room: &RoomModel) -> Result<(), RoomError>;

    async fn add_track(&self, room_id: &str, track: TrackModel) -> Result<(), RoomError>;
    async fn list_tracks(&self, room_id: &str) -> Result<Vec<TrackModel>, RoomError>;
    /// Returns whether a track was actually removed
    async fn remove_track(&self, room_id: &str, track_id: &str) -> Result<bool, RoomError>;
}

/// In-memory implementation of RoomRepository for development and testing
pub struct InMemoryRoomRepository {
    next_id: AtomicU64,
    rooms: Mutex<HashMap<String, RoomModel>>,
    playlists: Mutex<HashMap<String, Vec<TrackModel>>>,
}

impl Default for InMemoryRoomRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRoomRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            rooms: Mutex::new(HashMap::new()),
            playlists: Mutex::new(HashMap::new()),
        }
    }

    fn assign_id(&self) -> String {
        (self.next_id.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    #[instrument(skip(self, room), fields(name = %room.name))]
    async fn create_room(&self, mut room: RoomModel) -> Result<RoomModel, RoomError> {
        room.id = self.assign_id();

        let mut rooms = self.rooms.lock().await;
        if rooms.contains_key(&room.id) {
            warn!(room_id = %room.id, "Assigned room id already in use");
            return Err(RoomError::Registry(format!(
                "Room id {} already in use",
                room.id
            )));
        }
        rooms.insert(room.id.clone(), room.clone());
        drop(rooms);

        self.playlists
            .lock()
            .await
            .insert(room.id.clone(), Vec::new());

        info!(room_id = %room.id, "Room created in memory");
        Ok(room)
    }

    #[instrument(skip(self))]
    async fn get_room(&self, room_id: &str) -> Result<Option<RoomModel>, RoomError> {
        let room = self.rooms.lock().await.get(room_id).cloned();
        if room.is_none() {
            debug!(room_id = %room_id, "Room not found in memory");
        }
        Ok(room)
    }

    #[instrument(skip(self))]
    async fn list_rooms(&self) -> Result<Vec<RoomModel>, RoomError> {
        let mut rooms: Vec<RoomModel> = self.rooms.lock().await.values().cloned().collect();
        rooms.sort_by_key(|r| r.id.parse::<u64>().unwrap_or(u64::MAX));
        debug!(room_count = rooms.len(), "Rooms listed from memory");
        Ok(rooms)
    }

    #[instrument(skip(self, room), fields(room_id = %room.id))]
    async fn update_room(&self, room: &RoomModel) -> Result<(), RoomError> {
        let mut rooms = self.rooms.lock().await;
        match rooms.get_mut(&room.id) {
            Some(stored) => {
                *stored = room.clone();
                Ok(())
            }
            None => Err(RoomError::UnknownRoom(room.id.clone())),
        }
    }

    #[instrument(skip(self, track), fields(track_id = %track.id))]
    async fn add_track(&self, room_id: &str, track: TrackModel) -> Result<(), RoomError> {
        let mut playlists = self.playlists.lock().await;
        let playlist = playlists
            .get_mut(room_id)
            .ok_or_else(|| RoomError::UnknownRoom(room_id.to_string()))?;
        playlist.push(track);
        debug!(room_id = %room_id, playlist_len = playlist.len(), "Track added");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_tracks(&self, room_id: &str) -> Result<Vec<TrackModel>, RoomError> {
        self.playlists
            .lock()
            .await
            .get(room_id)
            .cloned()
            .ok_or_else(|| RoomError::UnknownRoom(room_id.to_string()))
    }

    #[instrument(skip(self))]
    async fn remove_track(&self, room_id: &str, track_id: &str) -> Result<bool, RoomError> {
        let mut playlists = self.playlists.lock().await;
        let playlist = playlists
            .get_mut(room_id)
            .ok_or_else(|| RoomError::UnknownRoom(room_id.to_string()))?;
        let before = playlist.len();
        playlist.retain(|t| t.id != track_id);
        Ok(playlist.len() < before)
    }
}
