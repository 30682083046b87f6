use serde_json::json;

use jukebox::{DispatchOutcome, EventTag, TrackModel, WebSocketMessage};

use super::setup::TestSetup;

// ============================================================================
// Action Helpers
// ============================================================================

impl TestSetup {
    pub fn member(&self, name: &str) -> &super::setup::TestMember {
        self.members
            .get(name)
            .unwrap_or_else(|| panic!("{name} is not part of this setup"))
    }

    /// Dispatch a message as if it arrived on `name`'s socket
    pub async fn send_message(&self, name: &str, message: WebSocketMessage) -> DispatchOutcome {
        let handle = &self.member(name).handle;
        self.state.dispatcher.dispatch(handle, message).await
    }

    /// Send a raw frame with an arbitrary tag
    pub async fn send_raw(&self, name: &str, tag: &str, payload: serde_json::Value) -> DispatchOutcome {
        let message: WebSocketMessage =
            serde_json::from_value(json!({ "type": tag, "payload": payload })).unwrap();
        self.send_message(name, message).await
    }

    /// Drain every member's inbox
    pub async fn clear_messages(&self) {
        for member in self.members.values() {
            let mut inbox = member.inbox.lock().await;
            while inbox.try_recv().is_ok() {}
        }
    }

    // ============================================================================
    // Convenience Action Methods
    // ============================================================================

    pub async fn send_welcome(&self, name: &str) -> DispatchOutcome {
        self.send_message(name, WebSocketMessage::new(EventTag::Welcome, json!({})))
            .await
    }

    pub async fn send_join(&self, name: &str) -> DispatchOutcome {
        let room_id = self.room_id.clone();
        self.send_join_room(name, &room_id).await
    }

    pub async fn send_join_room(&self, name: &str, room_id: &str) -> DispatchOutcome {
        self.send_message(
            name,
            WebSocketMessage::new(EventTag::JoinRoom, json!({ "roomId": room_id })),
        )
        .await
    }

    pub async fn send_leave(&self, name: &str) -> DispatchOutcome {
        self.send_message(name, WebSocketMessage::new(EventTag::LeaveRoom, json!({})))
            .await
    }

    pub async fn send_add_track(&self, name: &str, uri: &str) -> DispatchOutcome {
        self.send_message(
            name,
            WebSocketMessage::new(EventTag::AddTrack, json!({ "uri": uri })),
        )
        .await
    }

    pub async fn send_vote_skip(&self, name: &str) -> DispatchOutcome {
        self.send_message(name, WebSocketMessage::new(EventTag::VoteSkip, json!({})))
            .await
    }

    /// Simulate the socket closing: the hub drops the connection exactly once
    pub async fn disconnect(&self, name: &str) {
        let id = self.member(name).handle.id();
        if let Some(departure) = self.state.hub.unregister(id).await {
            jukebox::websockets::controllers::announce_departure(&self.state.hub, &departure)
                .await;
        }
    }

    // ============================================================================
    // Registry shortcuts
    // ============================================================================

    pub async fn current_track(&self) -> Option<TrackModel> {
        self.state
            .room_service
            .require_room(&self.room_id)
            .await
            .unwrap()
            .current_track
    }

    pub async fn pending_tracks(&self) -> Vec<TrackModel> {
        self.state
            .room_service
            .list_tracks(&self.room_id)
            .await
            .unwrap()
    }
}
