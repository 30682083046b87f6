use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, info, instrument, warn};

use super::selector::{play_order, select_next_track};
use super::skip_votes::VoteOutcome;
use crate::room::{models::TrackModel, service::RoomService, types::RoomSummary};
use crate::shared::RoomError;
use crate::websockets::{ConnectionHub, WebSocketMessage};

/// Playlist and skip-vote workflows for a room
///
/// One instance per process. The registry offers no multi-key atomicity, so
/// every read-select-remove-update sequence on a room runs under that room's
/// playback lock. Mutations always complete before the resulting broadcasts are
/// formed, so members never see an update that the registry does not yet reflect.
pub struct PlaybackService {
    rooms: Arc<RoomService>,
    hub: Arc<ConnectionHub>,
    locks: RwLock<HashMap<String, Arc<Mutex<()>>>>,
}

impl PlaybackService {
    pub fn new(rooms: Arc<RoomService>, hub: Arc<ConnectionHub>) -> Self {
        Self {
            rooms,
            hub,
            locks: RwLock::new(HashMap::new()),
        }
    }

    pub fn rooms(&self) -> &Arc<RoomService> {
        &self.rooms
    }

    pub fn hub(&self) -> &Arc<ConnectionHub> {
        &self.hub
    }

    async fn lock_room(&self, room_id: &str) -> OwnedMutexGuard<()> {
        let existing = self.locks.read().await.get(room_id).cloned();
        let lock = match existing {
            Some(lock) => lock,
            None => {
                let mut locks = self.locks.write().await;
                Arc::clone(locks.entry(room_id.to_string()).or_default())
            }
        };
        lock.lock_owned().await
    }

    /// Records a skip vote from `member_id`, announces the new tally and, on
    /// consensus, advances the room to its next track.
    #[instrument(skip(self))]
    pub async fn vote_skip(&self, room_id: &str, member_id: &str) -> Result<VoteOutcome, RoomError> {
        let _guard = self.lock_room(room_id).await;

        let members = self.hub.members(room_id).await;
        if !members.iter().any(|m| m == member_id) {
            warn!(room_id = %room_id, member_id = %member_id, "Skip vote from non-member rejected");
            return Err(RoomError::not_a_member(member_id, Some(room_id)));
        }

        // Consensus is among the members present now
        let tally = self.hub.skip_votes();
        tally.retain(room_id, &members).await;
        let outcome = tally.record_vote(room_id, member_id, members.len()).await;

        if outcome.skip {
            self.advance_locked(room_id).await?;
        } else {
            let message = WebSocketMessage::update_votes(room_id, outcome.votes, outcome.room_size);
            self.hub.broadcast(room_id, &message, None).await;
        }

        Ok(outcome)
    }

    /// Moves the room on to its next track and clears the skip tally.
    ///
    /// Used for consensus skips as well as natural end-of-track and host
    /// overrides. With an empty playlist the room simply stops playing.
    #[instrument(skip(self))]
    pub async fn advance_track(&self, room_id: &str) -> Result<Option<TrackModel>, RoomError> {
        let _guard = self.lock_room(room_id).await;
        self.advance_locked(room_id).await
    }

    // Caller holds the room's playback lock
    async fn advance_locked(&self, room_id: &str) -> Result<Option<TrackModel>, RoomError> {
        let mut room = self.rooms.require_room(room_id).await?;
        let playlist = self.rooms.list_tracks(room_id).await?;
        let next = select_next_track(&playlist).cloned();

        if let Some(track) = &next {
            self.rooms.remove_track(room_id, &track.id).await?;
        }
        let previous = std::mem::replace(&mut room.current_track, next.clone());
        self.rooms.update_room(&room).await?;
        self.hub.skip_votes().reset(room_id).await;

        info!(
            room_id = %room_id,
            previous = ?previous.map(|t| t.id),
            next = ?next.as_ref().map(|t| t.id.as_str()),
            "Track advanced"
        );

        let remaining: Vec<TrackModel> = playlist
            .into_iter()
            .filter(|t| Some(&t.id) != next.as_ref().map(|n| &n.id))
            .collect();
        self.announce_playlist(room_id, next.clone(), remaining).await;
        self.announce_room(room_id).await?;
        self.announce_votes(room_id).await;

        Ok(next)
    }

    /// Adds a track submitted by `member_id` to the sender's room. If nothing is
    /// playing the room starts on it straight away.
    #[instrument(skip(self))]
    pub async fn add_track(&self, room_id: &str, member_id: &str, uri: &str) -> Result<TrackModel, RoomError> {
        let _guard = self.lock_room(room_id).await;

        let track = TrackModel::new(uri, member_id);
        self.rooms.add_track(room_id, track.clone()).await?;
        debug!(room_id = %room_id, track_id = %track.id, "Track submitted");

        let room = self.rooms.require_room(room_id).await?;
        if !room.is_playing() {
            self.advance_locked(room_id).await?;
        } else {
            let playlist = self.rooms.list_tracks(room_id).await?;
            self.announce_playlist(room_id, room.current_track, playlist).await;
        }

        Ok(track)
    }

    /// Summary of one room with its live members
    pub async fn room_summary(&self, room_id: &str) -> Result<RoomSummary, RoomError> {
        let room = self.rooms.require_room(room_id).await?;
        let members = self.hub.members(room_id).await;
        Ok(RoomSummary::new(room, members))
    }

    /// Summaries of every room in the registry
    pub async fn room_summaries(&self) -> Result<Vec<RoomSummary>, RoomError> {
        let rooms = self.rooms.list_rooms().await?;
        let mut summaries = Vec::with_capacity(rooms.len());
        for room in rooms {
            let members = self.hub.members(&room.id).await;
            summaries.push(RoomSummary::new(room, members));
        }
        Ok(summaries)
    }

    /// Current track plus pending tracks in play order
    pub async fn playlist_message(&self, room_id: &str) -> Result<WebSocketMessage, RoomError> {
        let room = self.rooms.require_room(room_id).await?;
        let playlist = self.rooms.list_tracks(room_id).await?;
        Ok(WebSocketMessage::update_playlist(
            room_id,
            room.current_track,
            play_order(&playlist),
        ))
    }

    pub async fn votes_message(&self, room_id: &str) -> WebSocketMessage {
        let votes = self.hub.skip_votes().votes(room_id).await;
        let room_size = self.hub.room_size(room_id).await;
        WebSocketMessage::update_votes(room_id, votes, room_size)
    }

    async fn announce_playlist(&self, room_id: &str, current: Option<TrackModel>, pending: Vec<TrackModel>) {
        let message = WebSocketMessage::update_playlist(room_id, current, play_order(&pending));
        self.hub.broadcast(room_id, &message, None).await;
    }

    /// Broadcasts this room's summary to its members
    pub async fn announce_room(&self, room_id: &str) -> Result<(), RoomError> {
        let summary = self.room_summary(room_id).await?;
        let message = WebSocketMessage::update_rooms(vec![summary]);
        self.hub.broadcast(room_id, &message, None).await;
        Ok(())
    }

    pub async fn announce_votes(&self, room_id: &str) {
        let message = self.votes_message(room_id).await;
        self.hub.broadcast(room_id, &message, None).await;
    }
}
