#![allow(dead_code)] // Not every test file uses every helper

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

use jukebox::{
    room::repository::InMemoryRoomRepository, AppState, ConnectionHandle, RoomService,
    WebSocketMessage,
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

/// A connected participant: the handle the hub sees and the receiver its socket would drain
pub struct TestMember {
    pub handle: ConnectionHandle,
    pub inbox: Mutex<mpsc::UnboundedReceiver<WebSocketMessage>>,
}

pub struct TestSetup {
    pub state: AppState,
    pub room_id: String,
    pub members: HashMap<String, TestMember>,
}

pub struct TestSetupBuilder {
    members: Vec<String>,
    join: bool,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            members: vec![],
            join: true,
        }
    }

    pub fn with_members(mut self, members: Vec<&str>) -> Self {
        self.members = members.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_one_member(self) -> Self {
        self.with_members(vec!["alice"])
    }

    pub fn with_two_members(self) -> Self {
        self.with_members(vec!["alice", "bob"])
    }

    pub fn with_three_members(self) -> Self {
        self.with_members(vec!["alice", "bob", "carol"])
    }

    /// Connect members without joining the room
    pub fn not_joined(mut self) -> Self {
        self.join = false;
        self
    }

    pub async fn build(self) -> TestSetup {
        let room_service = Arc::new(RoomService::new(Arc::new(InMemoryRoomRepository::new())));
        let room = room_service.create_room("test room").await.unwrap();
        let state = AppState::new(room_service);

        let mut members = HashMap::new();
        for name in &self.members {
            let (handle, inbox) = ConnectionHandle::channel(name.clone());
            members.insert(
                name.clone(),
                TestMember {
                    handle,
                    inbox: Mutex::new(inbox),
                },
            );
        }

        let setup = TestSetup {
            state,
            room_id: room.id,
            members,
        };

        if self.join {
            for name in &self.members {
                setup.send_join(name).await;
            }
            setup.clear_messages().await;
        }

        setup
    }
}
