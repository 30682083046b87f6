use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::StreamExt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::hub::ConnectionHandle;
use super::messages::WebSocketMessage;
use crate::event::EventDispatcher;

/// Simple WebSocket abstraction - all we care about is send/receive
#[async_trait]
pub trait SocketWrapper: Send {
    /// Send a text message to the client
    async fn send_message(&mut self, message: String) -> Result<(), SocketError>;

    /// Receive the next message from the client (None if connection closed)
    async fn receive_message(&mut self) -> Result<Option<String>, SocketError>;

    /// Close the connection
    async fn close(&mut self) -> Result<(), SocketError>;
}

#[derive(Debug, Error)]
pub enum SocketError {
    #[error("Connection closed")]
    ConnectionClosed,
    #[error("Send failed: {0}")]
    SendFailed(String),
    #[error("Receive failed: {0}")]
    ReceiveFailed(String),
}

/// Direct implementation on axum's WebSocket
#[async_trait]
impl SocketWrapper for WebSocket {
    async fn send_message(&mut self, message: String) -> Result<(), SocketError> {
        self.send(Message::Text(message))
            .await
            .map_err(|e| SocketError::SendFailed(e.to_string()))
    }

    async fn receive_message(&mut self) -> Result<Option<String>, SocketError> {
        loop {
            match self.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text)),
                Some(Ok(Message::Close(_))) => return Ok(None),
                Some(Ok(_)) => continue, // binary/ping/pong carry no events
                Some(Err(e)) => return Err(SocketError::ReceiveFailed(e.to_string())),
                None => return Ok(None), // Connection closed
            }
        }
    }

    async fn close(&mut self) -> Result<(), SocketError> {
        self.send(Message::Close(None))
            .await
            .map_err(|e| SocketError::SendFailed(e.to_string()))
    }
}

/// Connection represents one participant's managed socket.
///
/// Outbound messages arrive on the channel whose sender lives in the hub;
/// inbound frames are decoded and dispatched one at a time, so a connection's
/// handlers never overlap.
pub struct Connection {
    handle: ConnectionHandle,
    socket: Box<dyn SocketWrapper>,
    outbound_receiver: mpsc::UnboundedReceiver<WebSocketMessage>,
    dispatcher: Arc<EventDispatcher>,
}

impl Connection {
    pub fn new(
        handle: ConnectionHandle,
        socket: Box<dyn SocketWrapper>,
        outbound_receiver: mpsc::UnboundedReceiver<WebSocketMessage>,
        dispatcher: Arc<EventDispatcher>,
    ) -> Self {
        Self {
            handle,
            socket,
            outbound_receiver,
            dispatcher,
        }
    }

    /// Run the connection - handles both sending and receiving until disconnect
    pub async fn run(mut self) -> Result<(), SocketError> {
        loop {
            tokio::select! {
                // Handle outbound messages (from our app to client)
                msg = self.outbound_receiver.recv() => {
                    match msg {
                        Some(message) => self.send(&message).await?,
                        None => break, // Channel closed, disconnect
                    }
                }

                // Handle inbound messages (from client to our app)
                msg = self.socket.receive_message() => {
                    match msg {
                        Ok(Some(frame)) => self.handle_frame(frame).await,
                        Ok(None) => break, // Client disconnected
                        Err(e) => return Err(e),
                    }
                }
            }
        }

        // Clean disconnect
        let _ = self.socket.close().await;
        Ok(())
    }

    async fn send(&mut self, message: &WebSocketMessage) -> Result<(), SocketError> {
        match serde_json::to_string(message) {
            Ok(json) => self.socket.send_message(json).await,
            Err(e) => {
                warn!(event = %message.event, error = %e, "Failed to encode outbound message");
                Ok(())
            }
        }
    }

    async fn handle_frame(&mut self, frame: String) {
        match serde_json::from_str::<WebSocketMessage>(&frame) {
            Ok(message) => {
                let outcome = self.dispatcher.dispatch(&self.handle, message).await;
                debug!(connection_id = %self.handle.id(), outcome = ?outcome, "Inbound message processed");
            }
            Err(e) => {
                warn!(
                    connection_id = %self.handle.id(),
                    member_id = %self.handle.member_id(),
                    error = %e,
                    "Failed to parse WebSocket message"
                );
            }
        }
    }
}
