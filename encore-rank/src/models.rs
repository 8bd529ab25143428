//! Response payloads handed to the dashboard and leaderboard views

use chrono::{DateTime, Utc};
use encore_common::db::{Song, SongId, UserId};
use encore_common::human_time::format_play_time;
use encore_common::score::display_average;
use encore_common::time::WeekWindow;
use serde::Serialize;

/// A user's own totals and where they place on each metric
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingInfo {
    pub user_id: UserId,
    /// Seconds
    pub play_time: i64,
    pub play_time_display: String,
    pub total_try: i64,
    pub average_score: f64,
    pub play_time_rank: i64,
    pub total_try_rank: i64,
    pub score_rank: i64,
}

impl RankingInfo {
    pub(crate) fn new(
        user_id: UserId,
        play_time: i64,
        total_try: i64,
        average_score: f64,
        ranks: (i64, i64, i64),
    ) -> Self {
        Self {
            user_id,
            play_time,
            play_time_display: format_play_time(play_time),
            total_try,
            average_score: display_average(average_score),
            play_time_rank: ranks.0,
            total_try_rank: ranks.1,
            score_rank: ranks.2,
        }
    }
}

/// One row of a global top-N list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopRankingEntry {
    pub rank: i64,
    pub user_id: UserId,
    pub username: String,
    pub avatar_url: Option<String>,
    pub play_time: i64,
    pub play_time_display: String,
    pub total_try: i64,
    pub average_score: f64,
}

/// The three global top-N lists
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopRankingResponse {
    pub play_time_top: Vec<TopRankingEntry>,
    pub total_try_top: Vec<TopRankingEntry>,
    pub score_top: Vec<TopRankingEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekSongInfo {
    pub song_id: SongId,
    pub title: String,
    pub image_url: Option<String>,
    pub writer: Option<String>,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
}

impl WeekSongInfo {
    pub fn new(song: Song, window: WeekWindow) -> Self {
        Self {
            song_id: song.song_id,
            title: song.title,
            image_url: song.image_url,
            writer: song.writer,
            window_start: window.start,
            window_end: window.end,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyLeaderboardEntry {
    pub rank: i64,
    pub username: String,
    pub score: i64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct WeeklyLeaderboardResponse {
    pub song: Option<WeekSongInfo>,
    pub entries: Vec<WeeklyLeaderboardEntry>,
}
