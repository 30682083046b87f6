// Public API
pub use handler::websocket_handler;
pub use hub::{ConnectionClosed, ConnectionHandle, ConnectionHub, ConnectionId, Departure};
pub use messages::{EventTag, WebSocketMessage};
pub use socket::{Connection, SocketError, SocketWrapper};

// Internal modules
pub mod controllers;
mod handler;
mod hub;
pub mod messages;
mod socket;
