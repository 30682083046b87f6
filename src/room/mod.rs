// Public API - what other modules can use
pub use handlers::{advance_track, create_room, get_playlist, list_rooms};

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod types;
