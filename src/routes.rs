use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::room;
use crate::shared::AppState;
use crate::websockets::websocket_handler;

/// HTTP and WebSocket routes of the server
pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "jukebox" }))
        .route("/rooms", get(room::list_rooms).post(room::create_room))
        .route("/rooms/:room_id/playlist", get(room::get_playlist))
        .route("/rooms/:room_id/advance", post(room::advance_track))
        .route("/ws", get(websocket_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
