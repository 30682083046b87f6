use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Registry model for a listening room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomModel {
    pub id: String, // Assigned by the registry on creation, never changed afterwards
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub current_track: Option<TrackModel>,
}

impl RoomModel {
    /// Creates an unsaved room; the id is left empty until the registry assigns one
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            created_at: Utc::now(),
            current_track: None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.current_track.is_some()
    }
}

/// A track submitted to a room's playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackModel {
    pub id: String,
    pub uri: String,
    pub submitted_at: DateTime<Utc>,
    pub submitted_by: String,
}

impl TrackModel {
    pub fn new(uri: impl Into<String>, submitted_by: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            uri: uri.into(),
            submitted_at: Utc::now(),
            submitted_by: submitted_by.into(),
        }
    }

    /// Submission time at the resolution used for play ordering
    pub fn submitted_millis(&self) -> i64 {
        self.submitted_at.timestamp_millis()
    }
}
