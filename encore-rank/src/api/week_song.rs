//! Song of the week and its leaderboard
//!
//! Both endpoints always answer 200; a missing selection is `null` or an
//! empty board.

use axum::{extract::State, routing::get, Json, Router};

use crate::models::{WeekSongInfo, WeeklyLeaderboardResponse};
use crate::AppState;

/// GET /api/week-song
pub async fn get_week_song(State(state): State<AppState>) -> Json<Option<WeekSongInfo>> {
    let now = encore_common::time::now();
    Json(state.leaderboard.current_week_song(now).await)
}

/// GET /api/week-song/ranking
pub async fn get_week_song_ranking(State(state): State<AppState>) -> Json<WeeklyLeaderboardResponse> {
    let now = encore_common::time::now();
    Json(state.leaderboard.weekly_leaderboard(now).await)
}

pub fn week_song_routes() -> Router<AppState> {
    Router::new()
        .route("/api/week-song", get(get_week_song))
        .route("/api/week-song/ranking", get(get_week_song_ranking))
}
