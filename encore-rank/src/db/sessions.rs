//! Practice session history
//!
//! Rows are appended by session intake and read back, one song and one
//! week at a time, by the weekly leaderboard.

use encore_common::db::{SessionRecord, SongId, UserId};
use encore_common::time::WeekWindow;
use encore_common::Result;
use sqlx::{Executor, Sqlite};

/// Session fields supplied by intake; the id is assigned on insert
#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: UserId,
    pub song_id: SongId,
    pub score: i64,
    pub duration_secs: i64,
    pub mode: String,
    /// Unix seconds
    pub practiced_at: i64,
}

/// One session joined with the player's display name
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ScoredSession {
    pub session_id: i64,
    pub user_id: UserId,
    pub username: String,
    pub score: i64,
    pub practiced_at: i64,
}

pub async fn insert<'e, E>(executor: E, session: &NewSession) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO practice_sessions (user_id, song_id, score, duration_secs, mode, practiced_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(session.user_id)
    .bind(session.song_id)
    .bind(session.score)
    .bind(session.duration_secs)
    .bind(&session.mode)
    .bind(session.practiced_at)
    .execute(executor)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn get<'e, E>(executor: E, session_id: i64) -> Result<Option<SessionRecord>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let record = sqlx::query_as::<_, SessionRecord>(
        r#"
        SELECT session_id, user_id, song_id, score, duration_secs, mode, practiced_at
        FROM practice_sessions
        WHERE session_id = ?
        "#,
    )
    .bind(session_id)
    .fetch_optional(executor)
    .await?;
    Ok(record)
}

/// Sessions for `song_id` practiced within `[window.start, window.end)`
pub async fn list_for_song_in_window<'e, E>(
    executor: E,
    song_id: SongId,
    window: &WeekWindow,
) -> Result<Vec<ScoredSession>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, ScoredSession>(
        r#"
        SELECT s.session_id, s.user_id, u.username, s.score, s.practiced_at
        FROM practice_sessions s
        JOIN users u ON u.user_id = s.user_id
        WHERE s.song_id = ? AND s.practiced_at >= ? AND s.practiced_at < ?
        ORDER BY s.practiced_at, s.session_id
        "#,
    )
    .bind(song_id)
    .bind(window.start_unix())
    .bind(window.end_unix())
    .fetch_all(executor)
    .await?;
    Ok(rows)
}
