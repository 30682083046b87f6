use std::sync::Arc;
use tracing::{info, warn};

use super::announce_departure;
use crate::event::{ConnectionContext, Payload};
use crate::playback::PlaybackService;
use crate::shared::RoomError;
use crate::websockets::messages::{JoinRoomPayload, WebSocketMessage};

/// Replies to the sender with every room and its live members
pub async fn welcome(ctx: ConnectionContext, playback: Arc<PlaybackService>, _payload: Payload) {
    match playback.room_summaries().await {
        Ok(summaries) => {
            if ctx.connection.send(WebSocketMessage::update_rooms(summaries)).is_err() {
                warn!(connection_id = %ctx.connection.id(), "Welcome reply not delivered");
            }
        }
        Err(e) => {
            warn!(connection_id = %ctx.connection.id(), error = %e, "Failed to list rooms for welcome");
        }
    }
}

/// Registers the sender in the requested room, catches it up on the playlist,
/// then tells the room about its new member list and skip threshold.
pub async fn join_room(ctx: ConnectionContext, playback: Arc<PlaybackService>, payload: Payload) -> Result<(), RoomError> {
    let JoinRoomPayload { room_id } = WebSocketMessage::payload_as(&payload)?;

    let departure = ctx.hub.register(&ctx.connection, &room_id).await?;
    if let Some(departure) = departure {
        announce_departure(&ctx.hub, &departure).await;
    }

    info!(
        room_id = %room_id,
        member_id = %ctx.member_id(),
        "Member joined room"
    );

    let playlist = playback.playlist_message(&room_id).await?;
    // A closed sender is evicted by the broadcasts below
    let _ = ctx.connection.send(playlist);

    playback.announce_room(&room_id).await?;
    playback.announce_votes(&room_id).await;
    Ok(())
}

/// Leaves the current room; a connection outside any room is left alone
pub async fn leave_room(ctx: ConnectionContext, _payload: Payload) {
    match ctx.hub.unregister(ctx.connection.id()).await {
        Some(departure) => {
            info!(
                room_id = %departure.room_id,
                member_id = %ctx.member_id(),
                "Member left room"
            );
            announce_departure(&ctx.hub, &departure).await;
        }
        None => {
            info!(member_id = %ctx.member_id(), "Leave from connection not in a room");
        }
    }
}
