use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::room::models::TrackModel;
use crate::room::types::RoomSummary;
use crate::shared::RoomError;

/// Event tags exchanged with clients
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum EventTag {
    // Client -> Server
    Welcome,
    JoinRoom,
    LeaveRoom,
    AddTrack,
    VoteSkip,

    // Both directions: clients may relay these, the server emits them on state changes
    UpdateRooms,
    UpdateVotes,
    UpdatePlaylist,

    // Server -> Client, unicast only
    Error,
}

/// Metadata for WebSocket messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessageMeta {
    pub timestamp: DateTime<Utc>,
}

/// Envelope for every frame in both directions.
///
/// The tag stays a plain string so frames carrying tags this server does not
/// know can still be decoded, logged and dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessage {
    #[serde(rename = "type")]
    pub event: String,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default)]
    pub meta: Option<WebSocketMessageMeta>,
}

/// Client-to-Server message payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomPayload {
    pub room_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTrackPayload {
    pub uri: String,
}

/// Server-to-Client message payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomsPayload {
    pub rooms: Vec<RoomSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotesPayload {
    pub room_id: String,
    pub votes: usize,
    pub room_size: usize,
    pub required: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistPayload {
    pub room_id: String,
    pub current_track: Option<TrackModel>,
    /// Pending tracks in play order
    pub tracks: Vec<TrackModel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub kind: String,
    pub message: String,
}

/// Helper functions for creating messages
impl WebSocketMessage {
    pub fn new(tag: EventTag, payload: serde_json::Value) -> Self {
        Self {
            event: tag.to_string(),
            payload,
            meta: Some(WebSocketMessageMeta {
                timestamp: Utc::now(),
            }),
        }
    }

    fn with_payload<P: Serialize>(tag: EventTag, payload: &P) -> Self {
        // Payload types are plain structs with string keys, so this cannot fail
        let value = serde_json::to_value(payload).unwrap_or(serde_json::Value::Null);
        Self::new(tag, value)
    }

    /// Parsed tag, or None for tags this server does not know
    pub fn tag(&self) -> Option<EventTag> {
        self.event.parse().ok()
    }

    /// Deserialize the payload into a handler's typed payload
    pub fn payload_as<P: DeserializeOwned>(payload: &serde_json::Value) -> Result<P, RoomError> {
        serde_json::from_value(payload.clone())
            .map_err(|e| RoomError::InvalidPayload(e.to_string()))
    }

    /// Create an UPDATE_ROOMS message
    pub fn update_rooms(rooms: Vec<RoomSummary>) -> Self {
        Self::with_payload(EventTag::UpdateRooms, &RoomsPayload { rooms })
    }

    /// Create an UPDATE_VOTES message
    pub fn update_votes(room_id: &str, votes: usize, room_size: usize) -> Self {
        let payload = VotesPayload {
            room_id: room_id.to_string(),
            votes,
            room_size,
            required: crate::playback::votes_required(room_size),
        };
        Self::with_payload(EventTag::UpdateVotes, &payload)
    }

    /// Create an UPDATE_PLAYLIST message
    pub fn update_playlist(
        room_id: &str,
        current_track: Option<TrackModel>,
        tracks: Vec<TrackModel>,
    ) -> Self {
        let payload = PlaylistPayload {
            room_id: room_id.to_string(),
            current_track,
            tracks,
        };
        Self::with_payload(EventTag::UpdatePlaylist, &payload)
    }

    /// Create an ERROR message
    pub fn error(error: &RoomError) -> Self {
        let payload = ErrorPayload {
            kind: error.kind().to_string(),
            message: error.to_string(),
        };
        Self::with_payload(EventTag::Error, &payload)
    }
}
