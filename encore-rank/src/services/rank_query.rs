//! RankQueryEngine: competition ranks and top-N lists
//!
//! Rank is `1 + number of users strictly ahead`, so tied users share a rank
//! and the following rank is skipped (1, 2, 2, 4). A user without a
//! performance record counts as zero on every metric.
//!
//! Every query is a single statement and therefore one consistent snapshot.
//! Ranks may trail a concurrent update by one write; that is acceptable.

use crate::models::{RankingInfo, TopRankingEntry, TopRankingResponse};
use encore_common::db::UserId;
use encore_common::human_time::format_play_time;
use encore_common::score::display_average;
use encore_common::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// Ranked dimension of a performance record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    PlayTime,
    TotalTry,
    #[serde(rename = "score")]
    AverageScore,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::PlayTime, Metric::TotalTry, Metric::AverageScore];

    /// Backing column; a fixed identifier, never user text
    fn column(self) -> &'static str {
        match self {
            Metric::PlayTime => "total_play_time",
            Metric::TotalTry => "total_try",
            Metric::AverageScore => "average_score",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::PlayTime => "play_time",
            Metric::TotalTry => "total_try",
            Metric::AverageScore => "score",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "play_time" | "playTime" => Ok(Metric::PlayTime),
            "total_try" | "totalTry" => Ok(Metric::TotalTry),
            "score" | "average_score" | "averageScore" => Ok(Metric::AverageScore),
            other => Err(Error::InvalidInput(format!("unknown ranking metric: {}", other))),
        }
    }
}

/// One ranked user, unrounded; derived on demand and never stored
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct RankEntry {
    pub rank: i64,
    pub user_id: UserId,
    pub username: String,
    pub avatar_url: Option<String>,
    pub total_play_time: i64,
    pub total_try: i64,
    pub average_score: f64,
}

impl RankEntry {
    pub fn metric_value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::PlayTime => self.total_play_time as f64,
            Metric::TotalTry => self.total_try as f64,
            Metric::AverageScore => self.average_score,
        }
    }
}

impl From<RankEntry> for TopRankingEntry {
    fn from(entry: RankEntry) -> Self {
        Self {
            rank: entry.rank,
            user_id: entry.user_id,
            username: entry.username,
            avatar_url: entry.avatar_url,
            play_time: entry.total_play_time,
            play_time_display: format_play_time(entry.total_play_time),
            total_try: entry.total_try,
            average_score: display_average(entry.average_score),
        }
    }
}

/// Competition rank of `user_id` on `metric`.
///
/// Never fails for missing data: a user with no record ranks behind every
/// user with a positive value.
pub async fn rank(db: &SqlitePool, user_id: UserId, metric: Metric) -> Result<i64> {
    let col = metric.column();
    let sql = format!(
        "SELECT 1 + COUNT(*) FROM performance_records \
         WHERE {col} > COALESCE((SELECT {col} FROM performance_records WHERE user_id = ?), 0)"
    );
    let rank: i64 = sqlx::query_scalar(&sql).bind(user_id).fetch_one(db).await?;
    debug!("Rank computed: user_id={}, metric={}, rank={}", user_id, metric, rank);
    Ok(rank)
}

/// Users sorted by `metric` descending, at most `n` of them.
///
/// Each entry carries its competition rank, not its list position. Equal
/// values are listed by ascending user id.
pub async fn top_n(db: &SqlitePool, metric: Metric, n: usize) -> Result<Vec<RankEntry>> {
    if n == 0 {
        return Ok(Vec::new());
    }
    let col = metric.column();
    let sql = format!(
        r#"
        SELECT
            (SELECT 1 + COUNT(*) FROM performance_records o WHERE o.{col} > r.{col}) AS rank,
            r.user_id, u.username, u.avatar_url,
            r.total_play_time, r.total_try, r.average_score
        FROM performance_records r
        JOIN users u ON u.user_id = r.user_id
        ORDER BY r.{col} DESC, r.user_id ASC
        LIMIT ?
        "#
    );
    let limit = i64::try_from(n).unwrap_or(i64::MAX);
    let entries = sqlx::query_as::<_, RankEntry>(&sql)
        .bind(limit)
        .fetch_all(db)
        .await?;
    Ok(entries)
}

#[derive(FromRow)]
struct RankingInfoRow {
    play_time: i64,
    total_try: i64,
    average_score: f64,
    play_time_rank: i64,
    total_try_rank: i64,
    score_rank: i64,
}

/// Dashboard summary: the user's totals and all three ranks.
///
/// `NotFound` only when the user account does not exist; a user who has
/// never practiced gets zeros and last-place ranks.
pub async fn ranking_info(db: &SqlitePool, user_id: UserId) -> Result<RankingInfo> {
    let row = sqlx::query_as::<_, RankingInfoRow>(
        r#"
        SELECT
            COALESCE(r.total_play_time, 0) AS play_time,
            COALESCE(r.total_try, 0) AS total_try,
            COALESCE(r.average_score, 0.0) AS average_score,
            (SELECT 1 + COUNT(*) FROM performance_records o
              WHERE o.total_play_time > COALESCE(r.total_play_time, 0)) AS play_time_rank,
            (SELECT 1 + COUNT(*) FROM performance_records o
              WHERE o.total_try > COALESCE(r.total_try, 0)) AS total_try_rank,
            (SELECT 1 + COUNT(*) FROM performance_records o
              WHERE o.average_score > COALESCE(r.average_score, 0.0)) AS score_rank
        FROM users u
        LEFT JOIN performance_records r ON r.user_id = u.user_id
        WHERE u.user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;

    let Some(row) = row else {
        return Err(Error::NotFound(format!("user {}", user_id)));
    };

    info!(
        "Ranking info: user_id={}, ranks=({}, {}, {})",
        user_id, row.play_time_rank, row.total_try_rank, row.score_rank
    );
    Ok(RankingInfo::new(
        user_id,
        row.play_time,
        row.total_try,
        row.average_score,
        (row.play_time_rank, row.total_try_rank, row.score_rank),
    ))
}

/// All three top-N lists
pub async fn top_rankings(db: &SqlitePool, n: usize) -> Result<TopRankingResponse> {
    let play_time_top = top_n(db, Metric::PlayTime, n).await?;
    let total_try_top = top_n(db, Metric::TotalTry, n).await?;
    let score_top = top_n(db, Metric::AverageScore, n).await?;

    Ok(TopRankingResponse {
        play_time_top: play_time_top.into_iter().map(Into::into).collect(),
        total_try_top: total_try_top.into_iter().map(Into::into).collect(),
        score_top: score_top.into_iter().map(Into::into).collect(),
    })
}
