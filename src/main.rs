use jukebox::{
    room::repository::InMemoryRoomRepository, routes::router, AppConfig, AppState, RoomService,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jukebox=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();
    info!(config = ?config, "Starting jukebox server");

    // The registry is external to the coordination core; the in-memory one is
    // enough for a single process
    let room_repository = Arc::new(InMemoryRoomRepository::new());
    let room_service =
        Arc::new(RoomService::new(room_repository).with_timeout(config.registry_timeout));

    let app = router(AppState::new(room_service));

    let listener = match tokio::net::TcpListener::bind(&config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(bind_addr = %config.bind_addr, error = %e, "Failed to bind listener");
            std::process::exit(1);
        }
    };
    info!(bind_addr = %config.bind_addr, "Server listening");

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "Server stopped with error");
        std::process::exit(1);
    }
}
