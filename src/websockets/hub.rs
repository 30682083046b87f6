use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::playback::SkipVoteTally;
use crate::room::service::RoomService;
use crate::shared::RoomError;

use super::messages::WebSocketMessage;

pub type ConnectionId = Uuid;

/// Sending half of one participant's duplex channel.
///
/// The socket task owns the receiving half; once it goes away every send fails
/// and the hub drops the connection on its next broadcast.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    member_id: String,
    sender: mpsc::UnboundedSender<WebSocketMessage>,
}

/// The receiving half of a connection was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionClosed;

impl ConnectionHandle {
    pub fn new(member_id: impl Into<String>, sender: mpsc::UnboundedSender<WebSocketMessage>) -> Self {
        Self {
            id: Uuid::new_v4(),
            member_id: member_id.into(),
            sender,
        }
    }

    /// Handle plus the receiver its socket task would read from
    pub fn channel(member_id: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<WebSocketMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(member_id, sender), receiver)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn member_id(&self) -> &str {
        &self.member_id
    }

    /// Fire-and-forget unicast
    pub fn send(&self, message: WebSocketMessage) -> Result<(), ConnectionClosed> {
        self.sender.send(message).map_err(|_| ConnectionClosed)
    }
}

/// A connection left its room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub room_id: String,
    /// The room had no connections left and its hub entry was removed
    pub room_emptied: bool,
}

type RoomMembers = HashMap<ConnectionId, ConnectionHandle>;

/// Registry of live connections grouped by room, and the only way to reach them.
///
/// Lock discipline: the outer map is read-locked for lookups and inserts into an
/// existing room, write-locked only to create or remove a room entry. Each room
/// has its own lock; broadcasts hold it for reading while they send, and
/// membership changes hold it for writing, so a broadcast always delivers to one
/// consistent snapshot.
pub struct ConnectionHub {
    rooms: RwLock<HashMap<String, Arc<RwLock<RoomMembers>>>>,
    // connection -> room it is currently joined to
    assignments: Mutex<HashMap<ConnectionId, String>>,
    room_service: Arc<RoomService>,
    skip_votes: Arc<SkipVoteTally>,
}

impl ConnectionHub {
    pub fn new(room_service: Arc<RoomService>) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            assignments: Mutex::new(HashMap::new()),
            room_service,
            skip_votes: Arc::new(SkipVoteTally::new()),
        }
    }

    /// Skip votes share the hub's lifetime; state for a room goes when its last member leaves
    pub fn skip_votes(&self) -> &Arc<SkipVoteTally> {
        &self.skip_votes
    }

    /// Adds the connection to `room_id`, leaving any other room first.
    ///
    /// Registering again for the same room is a no-op. Fails with `UnknownRoom`
    /// if the registry has no such room.
    pub async fn register(&self, connection: &ConnectionHandle, room_id: &str) -> Result<Option<Departure>, RoomError> {
        if self.room_service.get_room(room_id).await?.is_none() {
            warn!(room_id = %room_id, connection_id = %connection.id(), "Register for unknown room");
            return Err(RoomError::UnknownRoom(room_id.to_string()));
        }

        let previous = self
            .assignments
            .lock()
            .await
            .insert(connection.id(), room_id.to_string());

        let departure = match previous {
            Some(prev) if prev == room_id => {
                debug!(room_id = %room_id, connection_id = %connection.id(), "Already registered");
                return Ok(None);
            }
            Some(prev) => Some(self.remove_from_room(&prev, connection.id()).await),
            None => None,
        };

        self.add_to_room(room_id, connection.clone()).await;

        info!(
            room_id = %room_id,
            connection_id = %connection.id(),
            member_id = %connection.member_id(),
            "Connection joined room"
        );

        Ok(departure)
    }

    /// Removes the connection from its room. Safe to call repeatedly.
    pub async fn unregister(&self, connection_id: ConnectionId) -> Option<Departure> {
        let room_id = self.assignments.lock().await.remove(&connection_id)?;
        let departure = self.remove_from_room(&room_id, connection_id).await;

        info!(
            room_id = %room_id,
            connection_id = %connection_id,
            room_emptied = departure.room_emptied,
            "Connection left room"
        );

        Some(departure)
    }

    /// Sends `message` to every connection in the room except `excluding`.
    ///
    /// Connections whose transport is gone are logged and unregistered; the rest
    /// of the room still receives the message, then hears about the departure.
    /// Returns the number delivered.
    pub async fn broadcast(&self, room_id: &str, message: &WebSocketMessage, excluding: Option<ConnectionId>) -> usize {
        let (delivered, mut closed) = self.deliver(room_id, message, excluding).await;

        while !closed.is_empty() {
            let mut departures = Vec::new();
            for id in closed.drain(..) {
                departures.extend(self.evict(room_id, id).await);
            }
            // One notice covers every eviction; evictions it causes loop again
            if let Some(notice) = self.departure_notice_for(&departures).await {
                let (_, more) = self.deliver(room_id, &notice, None).await;
                closed = more;
            }
        }

        debug!(room_id = %room_id, event = %message.event, delivered = delivered, "Broadcast sent");
        delivered
    }

    /// Message telling the members left behind how the skip threshold moved,
    /// or None when nobody is left to tell
    pub async fn departure_notice(&self, departure: &Departure) -> Option<WebSocketMessage> {
        if departure.room_emptied {
            debug!(room_id = %departure.room_id, "Room emptied, nobody to notify");
            return None;
        }

        let room_id = &departure.room_id;
        let votes = self.skip_votes.votes(room_id).await;
        let room_size = self.room_size(room_id).await;
        Some(WebSocketMessage::update_votes(room_id, votes, room_size))
    }

    async fn departure_notice_for(&self, departures: &[Departure]) -> Option<WebSocketMessage> {
        match departures.iter().find(|d| !d.room_emptied) {
            Some(departure) => self.departure_notice(departure).await,
            None => None,
        }
    }

    /// Sends to one snapshot of the room; returns the delivered count and the closed connections
    async fn deliver(
        &self,
        room_id: &str,
        message: &WebSocketMessage,
        excluding: Option<ConnectionId>,
    ) -> (usize, Vec<ConnectionId>) {
        let members = self.rooms.read().await.get(room_id).cloned();
        let Some(members) = members else {
            debug!(room_id = %room_id, event = %message.event, "Broadcast to room with no connections");
            return (0, Vec::new());
        };

        let mut delivered = 0;
        let mut closed = Vec::new();
        let members = members.read().await;
        for (id, connection) in members.iter() {
            if Some(*id) == excluding {
                continue;
            }
            match connection.send(message.clone()) {
                Ok(()) => delivered += 1,
                Err(ConnectionClosed) => {
                    warn!(
                        room_id = %room_id,
                        connection_id = %id,
                        event = %message.event,
                        "Delivery failed, dropping connection"
                    );
                    closed.push(*id);
                }
            }
        }

        (delivered, closed)
    }

    /// Number of distinct members currently connected to the room
    pub async fn room_size(&self, room_id: &str) -> usize {
        self.members(room_id).await.len()
    }

    /// Distinct member identities connected to the room, sorted
    pub async fn members(&self, room_id: &str) -> Vec<String> {
        let members = self.rooms.read().await.get(room_id).cloned();
        match members {
            Some(members) => members
                .read()
                .await
                .values()
                .map(|c| c.member_id().to_string())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
            None => Vec::new(),
        }
    }

    pub async fn is_member(&self, room_id: &str, member_id: &str) -> bool {
        let members = self.rooms.read().await.get(room_id).cloned();
        match members {
            Some(members) => members.read().await.values().any(|c| c.member_id() == member_id),
            None => false,
        }
    }

    /// Room the connection is currently joined to
    pub async fn room_of(&self, connection_id: ConnectionId) -> Option<String> {
        self.assignments.lock().await.get(&connection_id).cloned()
    }

    /// Rooms that currently have at least one connection
    pub async fn active_rooms(&self) -> Vec<String> {
        let mut rooms: Vec<String> = self.rooms.read().await.keys().cloned().collect();
        rooms.sort();
        rooms
    }

    async fn add_to_room(&self, room_id: &str, connection: ConnectionHandle) {
        {
            // Inserting under the outer read lock keeps a concurrent removal of an
            // emptied room from orphaning this connection.
            let rooms = self.rooms.read().await;
            if let Some(members) = rooms.get(room_id) {
                members.write().await.insert(connection.id(), connection);
                return;
            }
        }

        let mut rooms = self.rooms.write().await;
        let members = rooms.entry(room_id.to_string()).or_default();
        members.write().await.insert(connection.id(), connection);
    }

    async fn remove_from_room(&self, room_id: &str, connection_id: ConnectionId) -> Departure {
        let (now_empty, departed_member) = {
            let rooms = self.rooms.read().await;
            match rooms.get(room_id) {
                Some(members) => {
                    let mut members = members.write().await;
                    let removed = members.remove(&connection_id);
                    // Another tab of the same member keeps the member (and its vote) in the room
                    let departed = removed
                        .map(|c| c.member_id().to_string())
                        .filter(|member| !members.values().any(|c| c.member_id() == member));
                    (members.is_empty(), departed)
                }
                None => (false, None),
            }
        };

        let mut room_emptied = false;
        if now_empty {
            let mut rooms = self.rooms.write().await;
            let still_empty = match rooms.get(room_id) {
                Some(members) => members.read().await.is_empty(),
                None => false,
            };
            if still_empty {
                rooms.remove(room_id);
                room_emptied = true;
            }
        }

        if room_emptied {
            self.skip_votes.forget_room(room_id).await;
            debug!(room_id = %room_id, "Last connection left, room entry removed");
        } else if let Some(member_id) = departed_member {
            self.skip_votes.withdraw(room_id, &member_id).await;
        }

        Departure {
            room_id: room_id.to_string(),
            room_emptied,
        }
    }

    /// Drops a connection whose transport failed during a broadcast to `room_id`.
    ///
    /// Returns the departure only if the connection was still assigned to that
    /// room, so a later `unregister` from the socket task does not announce it twice.
    async fn evict(&self, room_id: &str, connection_id: ConnectionId) -> Option<Departure> {
        let assigned = {
            let mut assignments = self.assignments.lock().await;
            if assignments.get(&connection_id).map(String::as_str) == Some(room_id) {
                assignments.remove(&connection_id);
                true
            } else {
                false
            }
        };
        let departure = self.remove_from_room(room_id, connection_id).await;
        assigned.then_some(departure)
    }
}
