use std::sync::Arc;
use tracing::info;

use crate::event::{ConnectionContext, Payload};
use crate::playback::PlaybackService;
use crate::shared::RoomError;
use crate::websockets::messages::{AddTrackPayload, WebSocketMessage};

/// Queues a track in the sender's room
pub async fn add_track(ctx: ConnectionContext, playback: Arc<PlaybackService>, payload: Payload) -> Result<(), RoomError> {
    let AddTrackPayload { uri } = WebSocketMessage::payload_as(&payload)?;
    if uri.trim().is_empty() {
        return Err(RoomError::InvalidPayload("Track uri cannot be empty".to_string()));
    }
    let room_id = ctx.current_room().await?;

    let track = playback.add_track(&room_id, ctx.member_id(), &uri).await?;

    info!(
        room_id = %room_id,
        member_id = %ctx.member_id(),
        track_id = %track.id,
        "Track added"
    );
    Ok(())
}

/// Counts the sender's vote to skip the current track
pub async fn vote_skip(ctx: ConnectionContext, playback: Arc<PlaybackService>, _payload: Payload) -> Result<(), RoomError> {
    let room_id = ctx.current_room().await?;

    let outcome = playback.vote_skip(&room_id, ctx.member_id()).await?;

    info!(
        room_id = %room_id,
        member_id = %ctx.member_id(),
        votes = outcome.votes,
        room_size = outcome.room_size,
        skipped = outcome.skip,
        "Skip vote counted"
    );
    Ok(())
}
