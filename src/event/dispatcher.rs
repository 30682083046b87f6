use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::handler::{ConnectionContext, Handler};
use crate::playback::PlaybackService;
use crate::shared::RoomError;
use crate::websockets::{ConnectionHandle, ConnectionHub, EventTag, WebSocketMessage};

/// What happened to one inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled,
    /// The handler failed; the error was sent back to the originating connection only
    Rejected(RoomError),
    /// No handler bound for the tag; nothing ran
    Dropped(RoomError),
}

/// Routes inbound messages to the handler bound for their tag
///
/// Holds the hub and room store injected at startup and hands each handler
/// only the parts it declared. `dispatch` runs the handler to completion, so a
/// connection that awaits each dispatch in turn keeps its messages in order.
pub struct EventDispatcher {
    handlers: HashMap<EventTag, Handler>,
    hub: Arc<ConnectionHub>,
    playback: Arc<PlaybackService>,
}

impl EventDispatcher {
    pub fn new(playback: Arc<PlaybackService>) -> Self {
        Self {
            handlers: HashMap::new(),
            hub: Arc::clone(playback.hub()),
            playback,
        }
    }

    /// Binds `tag` to `handler`. A later binding for the same tag replaces the
    /// earlier one, which is returned.
    pub fn on(&mut self, tag: EventTag, handler: Handler) -> Option<Handler> {
        info!(event = %tag, capabilities = ?handler.capabilities(), "Binding event handler");
        let previous = self.handlers.insert(tag, handler);
        if previous.is_some() {
            debug!(event = %tag, "Replaced existing handler binding");
        }
        previous
    }

    pub fn is_bound(&self, tag: EventTag) -> bool {
        self.handlers.contains_key(&tag)
    }

    pub fn hub(&self) -> &Arc<ConnectionHub> {
        &self.hub
    }

    pub fn playback(&self) -> &Arc<PlaybackService> {
        &self.playback
    }

    /// Handles one already-decoded inbound message from `connection`
    pub async fn dispatch(&self, connection: &ConnectionHandle, message: WebSocketMessage) -> DispatchOutcome {
        let Some(handler) = message.tag().and_then(|tag| self.handlers.get(&tag)) else {
            warn!(
                connection_id = %connection.id(),
                event = %message.event,
                "No handler bound, dropping message"
            );
            return DispatchOutcome::Dropped(RoomError::Dropped(message.event));
        };

        debug!(
            connection_id = %connection.id(),
            member_id = %connection.member_id(),
            event = %message.event,
            "Dispatching message"
        );

        let ctx = ConnectionContext {
            connection: connection.clone(),
            hub: Arc::clone(&self.hub),
        };

        match handler.invoke(ctx, &self.playback, message.payload).await {
            Ok(()) => DispatchOutcome::Handled,
            Err(error) => {
                warn!(
                    connection_id = %connection.id(),
                    event = %message.event,
                    error = %error,
                    "Handler failed, notifying sender"
                );
                if connection.send(WebSocketMessage::error(&error)).is_err() {
                    debug!(connection_id = %connection.id(), "Sender already gone, error not delivered");
                }
                DispatchOutcome::Rejected(error)
            }
        }
    }
}
