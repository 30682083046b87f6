use tracing::debug;

use crate::event::{ConnectionContext, Payload};
use crate::shared::RoomError;
use crate::websockets::messages::{EventTag, WebSocketMessage};

/// Re-emits a client-sent update to the rest of the sender's room
async fn relay(ctx: ConnectionContext, tag: EventTag, payload: Payload) -> Result<(), RoomError> {
    let room_id = ctx.current_room().await?;
    let message = WebSocketMessage::new(tag, payload);
    let delivered = ctx
        .hub
        .broadcast(&room_id, &message, Some(ctx.connection.id()))
        .await;

    debug!(room_id = %room_id, event = %tag, delivered = delivered, "Relayed client update");
    Ok(())
}

pub async fn update_rooms(ctx: ConnectionContext, payload: Payload) -> Result<(), RoomError> {
    relay(ctx, EventTag::UpdateRooms, payload).await
}

pub async fn update_votes(ctx: ConnectionContext, payload: Payload) -> Result<(), RoomError> {
    relay(ctx, EventTag::UpdateVotes, payload).await
}

pub async fn update_playlist(ctx: ConnectionContext, payload: Payload) -> Result<(), RoomError> {
    relay(ctx, EventTag::UpdatePlaylist, payload).await
}
