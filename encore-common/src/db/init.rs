//! Database initialization
//!
//! Creates the database on first run and brings every table the ranking
//! service touches into existence. All statements are idempotent, so this
//! runs on every startup.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Busy timeout applied to every connection, in milliseconds.
///
/// Ranking updates take the write lock up front (`BEGIN IMMEDIATE`), so
/// contending writers wait here instead of failing.
pub const BUSY_TIMEOUT_MS: u64 = 5000;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Pragmas are per connection, so they go on the connect options rather
    // than a one-off query against the pool.
    // WAL lets dashboard reads proceed while a ranking update holds the write lock.
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables and indexes (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_users_table(pool).await?;
    create_songs_table(pool).await?;
    create_performance_records_table(pool).await?;
    create_week_selections_table(pool).await?;
    create_practice_sessions_table(pool).await?;
    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            user_id INTEGER PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            avatar_url TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_songs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS songs (
            song_id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            image_url TEXT,
            writer TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// One row per user; created lazily by the first recorded session
async fn create_performance_records_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS performance_records (
            user_id INTEGER PRIMARY KEY REFERENCES users(user_id),
            total_play_time INTEGER NOT NULL DEFAULT 0 CHECK (total_play_time >= 0),
            total_try INTEGER NOT NULL DEFAULT 0 CHECK (total_try >= 0),
            average_score REAL NOT NULL DEFAULT 0,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Song-of-the-week windows. The unique pair makes a duplicate insert for
/// the same window a no-op even when two schedulers race.
async fn create_week_selections_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS week_selections (
            week_id INTEGER PRIMARY KEY AUTOINCREMENT,
            song_id INTEGER NOT NULL REFERENCES songs(song_id),
            window_start INTEGER NOT NULL,
            window_end INTEGER NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (window_start < window_end),
            UNIQUE (window_start, window_end)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_practice_sessions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS practice_sessions (
            session_id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(user_id),
            song_id INTEGER NOT NULL REFERENCES songs(song_id),
            score INTEGER NOT NULL,
            duration_secs INTEGER NOT NULL,
            mode TEXT NOT NULL DEFAULT '',
            practiced_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Weekly aggregation scans one song over one time range
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_practice_sessions_song_time \
         ON practice_sessions(song_id, practiced_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn table_names(pool: &SqlitePool) -> Vec<String> {
        sqlx::query_scalar::<_, String>(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(pool)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_init_creates_all_tables() {
        let dir = TempDir::new().unwrap();
        let pool = init_database(&dir.path().join("encore.db")).await.unwrap();

        let tables = table_names(&pool).await;
        for expected in [
            "performance_records",
            "practice_sessions",
            "songs",
            "users",
            "week_selections",
        ] {
            assert!(tables.contains(&expected.to_string()), "missing table {}", expected);
        }
    }

    #[tokio::test]
    async fn test_init_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("encore.db");

        let pool = init_database(&path).await.unwrap();
        sqlx::query("INSERT INTO users (user_id, username) VALUES (1, 'alice')")
            .execute(&pool)
            .await
            .unwrap();
        pool.close().await;

        let pool = init_database(&path).await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_duplicate_week_window_rejected() {
        let dir = TempDir::new().unwrap();
        let pool = init_database(&dir.path().join("encore.db")).await.unwrap();

        sqlx::query("INSERT INTO songs (song_id, title) VALUES (20, 'Song')")
            .execute(&pool)
            .await
            .unwrap();
        let insert = "INSERT INTO week_selections (song_id, window_start, window_end) VALUES (20, 100, 200)";
        sqlx::query(insert).execute(&pool).await.unwrap();
        assert!(sqlx::query(insert).execute(&pool).await.is_err());
    }
}
