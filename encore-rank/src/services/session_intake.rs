//! Session intake: turns a finished practice session into stored history
//! and an updated performance record

use crate::db::sessions::NewSession;
use crate::services::ranking_updater::RankingUpdater;
use chrono::{DateTime, Utc};
use encore_common::db::{SongId, UserId};
use encore_common::human_time::parse_play_time;
use encore_common::{Error, Result};
use serde::Deserialize;
use tracing::info;

/// Duration as plain seconds or as an `HH:MM:SS` string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DurationInput {
    Seconds(i64),
    Clock(String),
}

impl DurationInput {
    pub fn to_seconds(&self) -> Result<i64> {
        match self {
            DurationInput::Seconds(secs) => Ok(*secs),
            DurationInput::Clock(text) => parse_play_time(text)
                .ok_or_else(|| Error::InvalidInput(format!("malformed duration: {:?}", text))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSubmission {
    pub user_id: UserId,
    pub song_id: SongId,
    pub score: i64,
    pub duration: DurationInput,
    #[serde(default)]
    pub mode: String,
    /// Defaults to the time of submission
    #[serde(default)]
    pub practiced_at: Option<DateTime<Utc>>,
}

impl SessionSubmission {
    fn into_new_session(self, now: DateTime<Utc>) -> Result<NewSession> {
        Ok(NewSession {
            user_id: self.user_id,
            song_id: self.song_id,
            score: self.score,
            duration_secs: self.duration.to_seconds()?,
            mode: self.mode,
            practiced_at: self.practiced_at.unwrap_or(now).timestamp(),
        })
    }
}

/// Store the session and fold it into the user's record. Returns the new
/// session id. Nothing is written when validation fails.
pub async fn submit_session(
    updater: &RankingUpdater,
    submission: SessionSubmission,
    now: DateTime<Utc>,
) -> Result<i64> {
    let session = submission.into_new_session(now)?;
    let (user_id, song_id, score) = (session.user_id, session.song_id, session.score);
    let session_id = updater.record_practice(session).await?;
    info!(
        "Session recorded: session_id={} user_id={} song_id={} score={}",
        session_id, user_id, song_id, score
    );
    Ok(session_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{performance, sessions, songs, users};
    use chrono::TimeZone;
    use encore_common::db::{init_database, Song, User};
    use sqlx::SqlitePool;
    use tempfile::TempDir;

    async fn setup() -> (TempDir, SqlitePool) {
        let dir = TempDir::new().unwrap();
        let pool = init_database(&dir.path().join("encore.db")).await.unwrap();
        users::insert_user(&pool, &User { user_id: 1, username: "alice".into(), avatar_url: None })
            .await
            .unwrap();
        songs::insert_song(
            &pool,
            &Song { song_id: 20, title: "Etude".into(), image_url: None, writer: None },
        )
        .await
        .unwrap();
        (dir, pool)
    }

    fn submission(json: &str) -> SessionSubmission {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_duration_forms() {
        let s = submission(r#"{"user_id":1,"song_id":20,"score":80,"duration":195}"#);
        assert_eq!(s.duration.to_seconds().unwrap(), 195);
        let s = submission(r#"{"user_id":1,"song_id":20,"score":80,"duration":"00:03:15"}"#);
        assert_eq!(s.duration.to_seconds().unwrap(), 195);
        assert_eq!(s.mode, "");
        assert!(s.practiced_at.is_none());
    }

    #[test]
    fn test_malformed_duration_rejected() {
        let s = submission(r#"{"user_id":1,"song_id":20,"score":80,"duration":"3 minutes"}"#);
        assert!(matches!(s.duration.to_seconds(), Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_submit_stores_session_and_record() {
        let (_dir, pool) = setup().await;
        let updater = RankingUpdater::new(pool.clone());
        let now = Utc.with_ymd_and_hms(2024, 6, 5, 9, 0, 0).unwrap();

        let s = submission(r#"{"user_id":1,"song_id":20,"score":80,"duration":"00:01:00","mode":"practice"}"#);
        let session_id = submit_session(&updater, s, now).await.unwrap();

        let stored = sessions::get(&pool, session_id).await.unwrap().unwrap();
        assert_eq!(stored.practiced_at, now.timestamp());
        assert_eq!(stored.duration_secs, 60);
        assert_eq!(stored.mode, "practice");

        let record = performance::get(&pool, 1).await.unwrap().unwrap();
        assert_eq!(record.total_try, 1);
        assert_eq!(record.total_play_time, 60);
    }

    #[tokio::test]
    async fn test_unknown_song_writes_nothing() {
        let (_dir, pool) = setup().await;
        let updater = RankingUpdater::new(pool.clone());

        let s = submission(r#"{"user_id":1,"song_id":99,"score":80,"duration":60}"#);
        let err = submit_session(&updater, s, Utc::now()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(performance::get(&pool, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_negative_score_rejected() {
        let (_dir, pool) = setup().await;
        let updater = RankingUpdater::new(pool.clone());

        let s = submission(r#"{"user_id":1,"song_id":20,"score":-1,"duration":60}"#);
        let err = submit_session(&updater, s, Utc::now()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
