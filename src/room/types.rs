use serde::{Deserialize, Serialize};

use super::models::{RoomModel, TrackModel};

/// Request payload for creating a new room
#[derive(Debug, Deserialize)]
pub struct RoomCreateRequest {
    pub name: String,
}

/// Room as shown to clients: registry data plus the live member list from the hub
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: String,
    pub name: String,
    pub current_track: Option<TrackModel>,
    pub members: Vec<String>,
}

impl RoomSummary {
    pub fn new(room: RoomModel, members: Vec<String>) -> Self {
        Self {
            id: room.id,
            name: room.name,
            current_track: room.current_track,
            members,
        }
    }
}
