//! RankingUpdater: folds completed sessions into a user's aggregate
//!
//! Each update is a read-modify-write of one `performance_records` row.
//! Two guards keep concurrent sessions for the same user from losing an
//! update:
//! - an in-process lock per user id, so same-user updates queue up
//! - `BEGIN IMMEDIATE`, so the SQLite write lock is held from the read
//!   through the write and another process cannot interleave
//!
//! The transaction is a tracked `sqlx::Transaction`: if the update fails,
//! panics or is dropped before `COMMIT`, it is rolled back before the
//! connection is reused.
//!
//! Updates for different users only contend on the SQLite write lock.

use crate::db::{performance, sessions, songs, users};
use crate::db::sessions::NewSession;
use crate::services::keyed_lock::KeyedLocks;
use encore_common::db::{PerformanceRecord, UserId};
use encore_common::{Error, Result};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

/// Longest single session accepted, in seconds
pub const MAX_SESSION_DURATION_SECS: i64 = 24 * 60 * 60;

#[derive(Clone)]
pub struct RankingUpdater {
    db: SqlitePool,
    locks: KeyedLocks<UserId>,
}

impl RankingUpdater {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            locks: KeyedLocks::new(),
        }
    }

    /// Fold one session's score and duration into `user_id`'s record.
    ///
    /// Creates the record on the first session. Fails with `NotFound` for
    /// an unknown user, in which case nothing is written.
    pub async fn record_session(&self, user_id: UserId, score: i64, duration_secs: i64) -> Result<()> {
        validate(score, duration_secs)?;
        self.run_update(user_id, score, duration_secs, None).await?;
        Ok(())
    }

    /// Append a session to the history and fold it into the aggregate in
    /// one transaction. Returns the new session id.
    pub async fn record_practice(&self, session: NewSession) -> Result<i64> {
        validate(session.score, session.duration_secs)?;
        let (user_id, score, duration_secs) = (session.user_id, session.score, session.duration_secs);
        let session_id = self
            .run_update(user_id, score, duration_secs, Some(session))
            .await?;
        session_id.ok_or_else(|| Error::Internal("session insert returned no id".to_string()))
    }

    async fn run_update(
        &self,
        user_id: UserId,
        score: i64,
        duration_secs: i64,
        session: Option<NewSession>,
    ) -> Result<Option<i64>> {
        // Detached so a dropped HTTP request cannot abandon the connection
        // between BEGIN and COMMIT
        let task = tokio::spawn(locked_update(
            self.db.clone(),
            self.locks.clone(),
            user_id,
            score,
            duration_secs,
            session,
        ));

        task.await
            .map_err(|e| Error::Internal(format!("ranking update task failed: {}", e)))?
    }
}

async fn locked_update(
    db: SqlitePool,
    locks: KeyedLocks<UserId>,
    user_id: UserId,
    score: i64,
    duration_secs: i64,
    session: Option<NewSession>,
) -> Result<Option<i64>> {
    let _guard = locks.lock(user_id).await;
    let mut tx = db.begin_with("BEGIN IMMEDIATE").await?;

    // An error drops `tx` uncommitted, which rolls it back
    let session_id = apply(&mut *tx, user_id, score, duration_secs, session.as_ref()).await?;
    tx.commit().await?;
    Ok(session_id)
}

fn validate(score: i64, duration_secs: i64) -> Result<()> {
    if score < 0 {
        return Err(Error::InvalidInput(format!("score must not be negative: {}", score)));
    }
    if duration_secs < 0 {
        return Err(Error::InvalidInput(format!(
            "duration must not be negative: {}",
            duration_secs
        )));
    }
    if duration_secs > MAX_SESSION_DURATION_SECS {
        return Err(Error::InvalidInput(format!(
            "duration exceeds {} seconds: {}",
            MAX_SESSION_DURATION_SECS, duration_secs
        )));
    }
    Ok(())
}

async fn apply(
    conn: &mut SqliteConnection,
    user_id: UserId,
    score: i64,
    duration_secs: i64,
    session: Option<&NewSession>,
) -> Result<Option<i64>> {
    if !users::exists(&mut *conn, user_id).await? {
        warn!("Ranking update rejected, unknown user: user_id={}", user_id);
        return Err(Error::NotFound(format!("user {}", user_id)));
    }

    let session_id = match session {
        Some(session) => {
            if !songs::exists(&mut *conn, session.song_id).await? {
                warn!("Session rejected, unknown song: song_id={}", session.song_id);
                return Err(Error::NotFound(format!("song {}", session.song_id)));
            }
            Some(sessions::insert(&mut *conn, session).await?)
        }
        None => None,
    };

    let updated = match performance::get(&mut *conn, user_id).await? {
        Some(existing) => existing.with_session(score, duration_secs)?,
        None => {
            info!("Creating performance record: user_id={}", user_id);
            PerformanceRecord::first(user_id, score, duration_secs)
        }
    };
    performance::upsert(&mut *conn, &updated).await?;

    debug!(
        "Performance updated: user_id={}, total_try={}, average_score={}, total_play_time={}",
        updated.user_id, updated.total_try, updated.average_score, updated.total_play_time
    );
    Ok(session_id)
}
