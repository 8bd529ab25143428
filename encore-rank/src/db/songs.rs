//! Song catalog lookups

use encore_common::db::{Song, SongId};
use encore_common::Result;
use sqlx::{Executor, Sqlite};

pub async fn exists<'e, E>(executor: E, song_id: SongId) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM songs WHERE song_id = ?")
        .bind(song_id)
        .fetch_optional(executor)
        .await?;
    Ok(found.is_some())
}

pub async fn get<'e, E>(executor: E, song_id: SongId) -> Result<Option<Song>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let song = sqlx::query_as::<_, Song>(
        "SELECT song_id, title, image_url, writer FROM songs WHERE song_id = ?",
    )
    .bind(song_id)
    .fetch_optional(executor)
    .await?;
    Ok(song)
}

/// Songs that may become song of the week.
///
/// Ids at or below `reserved_max` are fixed chord drills and never rotate.
pub async fn eligible_song_ids<'e, E>(executor: E, reserved_max: SongId) -> Result<Vec<SongId>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let ids = sqlx::query_scalar("SELECT song_id FROM songs WHERE song_id > ? ORDER BY song_id")
        .bind(reserved_max)
        .fetch_all(executor)
        .await?;
    Ok(ids)
}

pub async fn insert_song<'e, E>(executor: E, song: &Song) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("INSERT INTO songs (song_id, title, image_url, writer) VALUES (?, ?, ?, ?)")
        .bind(song.song_id)
        .bind(&song.title)
        .bind(&song.image_url)
        .bind(&song.writer)
        .execute(executor)
        .await?;
    Ok(())
}
