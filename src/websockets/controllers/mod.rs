// Handlers bound to every inbound event tag
pub mod playlist;
pub mod relay;
pub mod rooms;

use super::hub::{ConnectionHub, Departure};
use super::messages::EventTag;
use crate::event::{EventDispatcher, Handler};

/// Binds the standard controller for each tag
pub fn bind_controllers(dispatcher: &mut EventDispatcher) {
    dispatcher.on(EventTag::Welcome, Handler::store(rooms::welcome));
    dispatcher.on(EventTag::JoinRoom, Handler::fallible_store(rooms::join_room));
    dispatcher.on(EventTag::LeaveRoom, Handler::connection(rooms::leave_room));
    dispatcher.on(EventTag::AddTrack, Handler::fallible_store(playlist::add_track));
    dispatcher.on(EventTag::VoteSkip, Handler::fallible_store(playlist::vote_skip));
    dispatcher.on(EventTag::UpdateRooms, Handler::fallible_connection(relay::update_rooms));
    dispatcher.on(EventTag::UpdateVotes, Handler::fallible_connection(relay::update_votes));
    dispatcher.on(EventTag::UpdatePlaylist, Handler::fallible_connection(relay::update_playlist));
}

/// Tells the members left behind how the skip threshold moved.
/// Needs only the hub, so it also runs on disconnect.
pub async fn announce_departure(hub: &ConnectionHub, departure: &Departure) {
    if let Some(notice) = hub.departure_notice(departure).await {
        hub.broadcast(&departure.room_id, &notice, None).await;
    }
}
