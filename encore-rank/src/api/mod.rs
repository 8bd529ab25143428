//! HTTP API handlers for encore-rank

pub mod health;
pub mod ranking;
pub mod sessions;
pub mod week_song;

pub use health::health_routes;
pub use ranking::ranking_routes;
pub use sessions::session_routes;
pub use week_song::week_song_routes;
