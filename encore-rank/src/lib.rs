//! encore-rank library - practice ranking and song-of-the-week service
//!
//! Maintains per-user performance aggregates, answers rank and top-N
//! queries, rotates the song of the week and serves its leaderboard.

use axum::Router;
use chrono::FixedOffset;
use encore_common::config::ServiceConfig;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use error::{ApiError, ApiResult};

use services::{RankingUpdater, WeeklyLeaderboard, WeeklySongScheduler};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<ServiceConfig>,
    pub updater: RankingUpdater,
    pub scheduler: WeeklySongScheduler,
    pub leaderboard: WeeklyLeaderboard,
}

impl AppState {
    /// Wire every service onto one pool.
    ///
    /// Fails only if the configured week offset is out of range.
    pub fn new(db: SqlitePool, config: ServiceConfig) -> encore_common::Result<Self> {
        let offset: FixedOffset = encore_common::time::utc_offset(config.week_utc_offset_minutes)?;
        Ok(Self {
            updater: RankingUpdater::new(db.clone()),
            scheduler: WeeklySongScheduler::new(db.clone(), offset, config.reserved_song_id_max),
            leaderboard: WeeklyLeaderboard::new(db.clone(), offset, config.leaderboard_size),
            config: Arc::new(config),
            db,
        })
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::ranking_routes())
        .merge(api::week_song_routes())
        .merge(api::session_routes())
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
