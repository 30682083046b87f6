use axum::{
    extract::{Query, State, WebSocketUpgrade},
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::shared::AppState;

use super::controllers::announce_departure;
use super::hub::ConnectionHandle;
use super::socket::Connection;

/// Query parameters of the upgrade request
#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    pub member: Option<String>,
}

/// WebSocket endpoint
/// GET /ws?member=<identity>; a missing identity gets a generated one
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(app_state): State<AppState>,
) -> Response {
    let member_id = params
        .member
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| petname::Petnames::default().generate_one(2, "-"));

    info!(member_id = %member_id, "WebSocket connection requested");

    ws.on_upgrade(move |socket| handle_websocket_connection(socket, member_id, app_state))
}

/// Handle the upgraded WebSocket connection
async fn handle_websocket_connection(
    socket: axum::extract::ws::WebSocket,
    member_id: String,
    app_state: AppState,
) {
    let (handle, outbound_receiver) = ConnectionHandle::channel(member_id.clone());
    let connection_id = handle.id();

    info!(
        connection_id = %connection_id,
        member_id = %member_id,
        "WebSocket connection established"
    );

    let connection = Connection::new(
        handle,
        Box::new(socket),
        outbound_receiver,
        Arc::clone(&app_state.dispatcher),
    );

    // Run the connection until disconnect
    match connection.run().await {
        Ok(()) => {
            info!(connection_id = %connection_id, "WebSocket connection closed cleanly");
        }
        Err(e) => {
            warn!(connection_id = %connection_id, error = %e, "WebSocket connection error");
        }
    }

    // Cleanup: leave whatever room the connection was in and tell the others
    if let Some(departure) = app_state.hub.unregister(connection_id).await {
        announce_departure(&app_state.hub, &departure).await;
    }
}
