//! WeekSelectionStore: which song is song of the week for which window

use encore_common::db::{SongId, WeekSelectionRow};
use encore_common::time::WeekWindow;
use encore_common::Result;
use sqlx::{Executor, Sqlite};

/// Exact window match, used by the scheduler's idempotency check
pub async fn find_by_window<'e, E>(executor: E, window: &WeekWindow) -> Result<Option<WeekSelectionRow>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, WeekSelectionRow>(
        r#"
        SELECT week_id, song_id, window_start, window_end
        FROM week_selections
        WHERE window_start = ? AND window_end = ?
        "#,
    )
    .bind(window.start_unix())
    .bind(window.end_unix())
    .fetch_optional(executor)
    .await?;
    Ok(row)
}

/// Selection whose `[start, end)` contains `instant` (Unix seconds)
pub async fn find_containing<'e, E>(executor: E, instant: i64) -> Result<Option<WeekSelectionRow>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, WeekSelectionRow>(
        r#"
        SELECT week_id, song_id, window_start, window_end
        FROM week_selections
        WHERE window_start <= ? AND ? < window_end
        ORDER BY window_start DESC
        LIMIT 1
        "#,
    )
    .bind(instant)
    .bind(instant)
    .fetch_optional(executor)
    .await?;
    Ok(row)
}

/// Most recent selection that started at or before `instant`
pub async fn find_latest_started<'e, E>(executor: E, instant: i64) -> Result<Option<WeekSelectionRow>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, WeekSelectionRow>(
        r#"
        SELECT week_id, song_id, window_start, window_end
        FROM week_selections
        WHERE window_start <= ?
        ORDER BY window_start DESC
        LIMIT 1
        "#,
    )
    .bind(instant)
    .fetch_optional(executor)
    .await?;
    Ok(row)
}

/// Insert a selection unless one already exists for the window.
///
/// Returns `true` when this call created the row.
pub async fn insert_if_absent<'e, E>(executor: E, song_id: SongId, window: &WeekWindow) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO week_selections (song_id, window_start, window_end, created_at)
        VALUES (?, ?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(window_start, window_end) DO NOTHING
        "#,
    )
    .bind(song_id)
    .bind(window.start_unix())
    .bind(window.end_unix())
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn count<'e, E>(executor: E) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let n = sqlx::query_scalar("SELECT COUNT(*) FROM week_selections")
        .fetch_one(executor)
        .await?;
    Ok(n)
}
