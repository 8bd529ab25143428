//! Database models

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// User identifier as issued by the external auth collaborator
pub type UserId = i64;

/// Song identifier as issued by the song catalog
pub type SongId = i64;

/// Account row (read-only here; owned by the auth collaborator)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub user_id: UserId,
    pub username: String,
    pub avatar_url: Option<String>,
}

/// Catalog row (read-only here; owned by the song catalog)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Song {
    pub song_id: SongId,
    pub title: String,
    pub image_url: Option<String>,
    pub writer: Option<String>,
}

/// Per-user running aggregate of practice performance.
///
/// `average_score` is the unrounded mean of every score ever submitted.
/// `total_play_time` is in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PerformanceRecord {
    pub user_id: UserId,
    pub total_play_time: i64,
    pub total_try: i64,
    pub average_score: f64,
}

impl PerformanceRecord {
    /// Record created by a user's first session
    pub fn first(user_id: UserId, score: i64, duration_secs: i64) -> Self {
        Self {
            user_id,
            total_play_time: duration_secs,
            total_try: 1,
            average_score: score as f64,
        }
    }

    /// Fold one more session into the aggregate.
    ///
    /// Fails with `InvalidInput` if a counter would overflow; `self` is
    /// left as it was.
    pub fn with_session(&self, score: i64, duration_secs: i64) -> Result<Self> {
        let total_play_time = self.total_play_time.checked_add(duration_secs).ok_or_else(|| {
            Error::InvalidInput(format!(
                "play time overflow for user {}: {} + {}",
                self.user_id, self.total_play_time, duration_secs
            ))
        })?;
        let total_try = self.total_try.checked_add(1).ok_or_else(|| {
            Error::InvalidInput(format!("try count overflow for user {}", self.user_id))
        })?;
        Ok(Self {
            user_id: self.user_id,
            total_play_time,
            total_try,
            average_score: crate::score::fold_mean(
                self.average_score,
                self.total_try,
                score as f64,
            ),
        })
    }
}

/// Song-of-the-week row; instants are Unix seconds, window is `[start, end)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct WeekSelectionRow {
    pub week_id: i64,
    pub song_id: SongId,
    pub window_start: i64,
    pub window_end: i64,
}

/// One completed practice session as delivered by session intake
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SessionRecord {
    pub session_id: i64,
    pub user_id: UserId,
    pub song_id: SongId,
    pub score: i64,
    pub duration_secs: i64,
    pub mode: String,
    /// Unix seconds
    pub practiced_at: i64,
}
