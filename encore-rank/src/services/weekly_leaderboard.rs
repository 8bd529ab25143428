//! WeeklyLeaderboardAggregator: the song of the week and its settled board
//!
//! The board for a song is computed from sessions recorded during the
//! previous, fully elapsed week window. Each user appears once with their
//! best score. Equal best scores are ordered by who reached the score first.
//!
//! Reads here never fail the caller: a storage error is logged and the
//! result degrades to "no song" or an empty board.

use crate::db::sessions::ScoredSession;
use crate::db::{sessions, songs, week_selections};
use crate::models::{WeekSongInfo, WeeklyLeaderboardEntry, WeeklyLeaderboardResponse};
use crate::services::week_song_scheduler::WeekSelection;
use chrono::{DateTime, FixedOffset, Utc};
use encore_common::db::UserId;
use encore_common::time::WeekWindow;
use encore_common::Result;
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct WeeklyLeaderboard {
    db: SqlitePool,
    offset: FixedOffset,
    size: usize,
}

impl WeeklyLeaderboard {
    pub fn new(db: SqlitePool, offset: FixedOffset, size: usize) -> Self {
        Self { db, offset, size }
    }

    /// Song of the week at `now`, or `None` if nothing has been selected
    pub async fn current_week_song(&self, now: DateTime<Utc>) -> Option<WeekSongInfo> {
        match self.load_current(now).await {
            Ok(info) => info.map(|(_, info)| info),
            Err(e) => {
                warn!("Failed to load song of the week: {}", e);
                None
            }
        }
    }

    pub async fn weekly_leaderboard(&self, now: DateTime<Utc>) -> WeeklyLeaderboardResponse {
        let (selection, song) = match self.load_current(now).await {
            Ok(Some(current)) => current,
            Ok(None) => return WeeklyLeaderboardResponse::default(),
            Err(e) => {
                warn!("Failed to load song of the week: {}", e);
                return WeeklyLeaderboardResponse::default();
            }
        };

        let window = WeekWindow::previous_before(now, self.offset);
        let entries = match sessions::list_for_song_in_window(&self.db, selection.song_id, &window).await {
            Ok(rows) => {
                debug!(
                    "Weekly leaderboard: song_id={} window=[{}, {}) sessions={}",
                    selection.song_id,
                    window.start,
                    window.end,
                    rows.len()
                );
                best_scores(rows, self.size)
            }
            Err(e) => {
                warn!("Failed to load weekly sessions for song {}: {}", selection.song_id, e);
                Vec::new()
            }
        };

        WeeklyLeaderboardResponse {
            song: Some(song),
            entries,
        }
    }

    /// Selection whose window contains `now`. When the scheduler skipped a
    /// week, the most recent earlier selection stays current.
    async fn load_current(&self, now: DateTime<Utc>) -> Result<Option<(WeekSelection, WeekSongInfo)>> {
        let instant = now.timestamp();
        let row = match week_selections::find_containing(&self.db, instant).await? {
            Some(row) => Some(row),
            None => {
                let stale = week_selections::find_latest_started(&self.db, instant).await?;
                if let Some(row) = &stale {
                    debug!(
                        "No selection for the current week, keeping song_id={} from week {}",
                        row.song_id, row.week_id
                    );
                }
                stale
            }
        };
        let Some(row) = row else {
            return Ok(None);
        };

        let selection = WeekSelection::try_from(row)?;
        let Some(song) = songs::get(&self.db, selection.song_id).await? else {
            warn!("Song of the week missing from catalog: song_id={}", selection.song_id);
            return Ok(None);
        };
        let info = WeekSongInfo::new(song, selection.window);
        Ok(Some((selection, info)))
    }
}

/// Reduce sessions to one best score per user, ranked.
///
/// `rows` must be in `(practiced_at, session_id)` order so that the first
/// session reaching a user's best score is the one kept.
pub fn best_scores(rows: Vec<ScoredSession>, size: usize) -> Vec<WeeklyLeaderboardEntry> {
    let mut best: HashMap<UserId, ScoredSession> = HashMap::new();
    for row in rows {
        // Strictly greater, so a repeat of the best keeps the earlier session
        let improves = best
            .get(&row.user_id)
            .map_or(true, |current| row.score > current.score);
        if improves {
            best.insert(row.user_id, row);
        }
    }

    let mut ordered: Vec<ScoredSession> = best.into_values().collect();
    ordered.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(a.practiced_at.cmp(&b.practiced_at))
            .then(a.session_id.cmp(&b.session_id))
    });
    ordered.truncate(size);

    let mut entries = Vec::with_capacity(ordered.len());
    for (i, row) in ordered.into_iter().enumerate() {
        let rank = match entries.last() {
            Some(WeeklyLeaderboardEntry { rank, score, .. }) if *score == row.score => *rank,
            _ => i as i64 + 1,
        };
        entries.push(WeeklyLeaderboardEntry {
            rank,
            username: row.username,
            score: row.score,
        });
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(session_id: i64, user_id: UserId, score: i64, practiced_at: i64) -> ScoredSession {
        ScoredSession {
            session_id,
            user_id,
            username: format!("user{}", user_id),
            score,
            practiced_at,
        }
    }

    #[test]
    fn test_keeps_best_score_per_user() {
        let rows = vec![session(1, 1, 70, 100), session(2, 1, 95, 200), session(3, 1, 80, 300)];
        let entries = best_scores(rows, 10);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].score, 95);
    }

    #[test]
    fn test_tie_goes_to_first_achiever() {
        // user2 reached 90 before user1 did
        let rows = vec![
            session(1, 2, 90, 100),
            session(2, 1, 50, 150),
            session(3, 1, 90, 200),
            session(4, 3, 99, 250),
        ];
        let entries = best_scores(rows, 10);
        let names: Vec<_> = entries.iter().map(|e| e.username.as_str()).collect();
        assert_eq!(names, ["user3", "user2", "user1"]);
        let ranks: Vec<_> = entries.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, [1, 2, 2]);
    }

    #[test]
    fn test_repeat_of_best_keeps_earliest() {
        let mut rows = vec![session(1, 1, 90, 500), session(2, 2, 90, 300), session(3, 1, 90, 100)];
        rows.sort_by_key(|r| (r.practiced_at, r.session_id));
        let entries = best_scores(rows, 10);
        assert_eq!(entries[0].username, "user1");
    }

    #[test]
    fn test_truncates_to_size() {
        let rows: Vec<_> = (1..=15).map(|u| session(u, u, u * 5, u)).collect();
        let entries = best_scores(rows, 10);
        assert_eq!(entries.len(), 10);
        assert_eq!(entries[0].score, 75);
        assert_eq!(entries[9].score, 30);
    }

    #[test]
    fn test_empty() {
        assert!(best_scores(Vec::new(), 10).is_empty());
    }
}
