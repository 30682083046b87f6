use axum::{
    extract::{Path, State},
    Json,
};
use tracing::{info, instrument};

use super::{
    models::TrackModel,
    types::{RoomCreateRequest, RoomSummary},
};
use crate::shared::{AppError, AppState};
use crate::websockets::messages::PlaylistPayload;

/// HTTP handler for creating a new room
///
/// POST /rooms
/// Returns the room with its registry-assigned id
#[instrument(name = "create_room", skip(state))]
pub async fn create_room(
    State(state): State<AppState>,
    Json(request): Json<RoomCreateRequest>,
) -> Result<Json<RoomSummary>, AppError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Room name cannot be empty".to_string()));
    }

    let room = state.room_service.create_room(name).await?;
    info!(room_id = %room.id, "Room created via HTTP");

    Ok(Json(RoomSummary::new(room, Vec::new())))
}

/// HTTP handler for listing all rooms
///
/// GET /rooms
#[instrument(name = "list_rooms", skip(state))]
pub async fn list_rooms(State(state): State<AppState>) -> Result<Json<Vec<RoomSummary>>, AppError> {
    let rooms = state.playback.room_summaries().await?;
    info!(room_count = rooms.len(), "Rooms listed successfully");
    Ok(Json(rooms))
}

/// GET /rooms/:room_id/playlist
/// Current track plus pending tracks in play order
#[instrument(name = "get_playlist", skip(state))]
pub async fn get_playlist(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<PlaylistPayload>, AppError> {
    let message = state.playback.playlist_message(&room_id).await?;
    let payload = serde_json::from_value(message.payload)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(Json(payload))
}

/// POST /rooms/:room_id/advance
/// Ends the current track without a vote (track finished or host override)
#[instrument(name = "advance_track", skip(state))]
pub async fn advance_track(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<Option<TrackModel>>, AppError> {
    let next = state.playback.advance_track(&room_id).await?;
    info!(room_id = %room_id, playing = next.is_some(), "Track advanced via HTTP");
    Ok(Json(next))
}
