//! WeeklySongScheduler: picks the next song of the week
//!
//! A run targets one week window and is idempotent per window: if a
//! selection already exists it is returned untouched. Sequential retries are
//! therefore safe. Concurrent schedulers in separate processes are also
//! contained, because the `(window_start, window_end)` unique constraint turns
//! the losing insert into a no-op and the loser re-reads the winner's row.

use crate::db::{songs, week_selections};
use encore_common::db::{SongId, WeekSelectionRow};
use encore_common::time::WeekWindow;
use encore_common::Result;
use chrono::{DateTime, FixedOffset, Utc};
use rand::seq::SliceRandom;
use serde::Serialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// A song bound to one week window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekSelection {
    pub week_id: i64,
    pub song_id: SongId,
    pub window: WeekWindow,
}

impl TryFrom<WeekSelectionRow> for WeekSelection {
    type Error = encore_common::Error;

    fn try_from(row: WeekSelectionRow) -> Result<Self> {
        Ok(Self {
            week_id: row.week_id,
            song_id: row.song_id,
            window: WeekWindow::from_unix(row.window_start, row.window_end)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerOutcome {
    Created(WeekSelection),
    AlreadyPresent(WeekSelection),
    /// No eligible songs; the previous selection stays current
    SkippedEmptyPool { window: WeekWindow },
}

impl SchedulerOutcome {
    pub fn selection(&self) -> Option<&WeekSelection> {
        match self {
            SchedulerOutcome::Created(s) | SchedulerOutcome::AlreadyPresent(s) => Some(s),
            SchedulerOutcome::SkippedEmptyPool { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    Idle,
    Selecting,
}

#[derive(Clone)]
pub struct WeeklySongScheduler {
    db: SqlitePool,
    offset: FixedOffset,
    reserved_song_id_max: SongId,
    /// Held for the whole of a run; locked means `Selecting`
    run_guard: Arc<Mutex<()>>,
}

impl WeeklySongScheduler {
    pub fn new(db: SqlitePool, offset: FixedOffset, reserved_song_id_max: SongId) -> Self {
        Self {
            db,
            offset,
            reserved_song_id_max,
            run_guard: Arc::new(Mutex::new(())),
        }
    }

    pub fn state(&self) -> SchedulerState {
        match self.run_guard.try_lock() {
            Ok(_) => SchedulerState::Idle,
            Err(_) => SchedulerState::Selecting,
        }
    }

    /// Timer entry point: select for the window starting at the first
    /// Monday midnight strictly after `now`
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<SchedulerOutcome> {
        self.run_for_window(WeekWindow::next_after(now, self.offset)).await
    }

    /// Startup entry point: make sure the week containing `now` has a song
    pub async fn ensure_current(&self, now: DateTime<Utc>) -> Result<SchedulerOutcome> {
        self.run_for_window(WeekWindow::containing(now, self.offset)).await
    }

    /// Startup and timer entry point: fill the containing week if it was
    /// missed, then select for the upcoming one
    pub async fn run_scheduled(&self, now: DateTime<Utc>) -> Result<SchedulerOutcome> {
        if let SchedulerOutcome::Created(selection) = self.ensure_current(now).await? {
            warn!(
                "Current week had no song, filled in song_id={} late",
                selection.song_id
            );
        }
        self.run_once(now).await
    }

    pub async fn run_for_window(&self, window: WeekWindow) -> Result<SchedulerOutcome> {
        let _selecting = self.run_guard.lock().await;

        if let Some(existing) = week_selections::find_by_window(&self.db, &window).await? {
            info!(
                "Song of the week already selected for [{}, {}): song_id={}",
                window.start, window.end, existing.song_id
            );
            return Ok(SchedulerOutcome::AlreadyPresent(existing.try_into()?));
        }

        let pool = songs::eligible_song_ids(&self.db, self.reserved_song_id_max).await?;
        let Some(song_id) = pick_song(&pool) else {
            warn!(
                "No eligible songs for week [{}, {}), keeping previous selection",
                window.start, window.end
            );
            return Ok(SchedulerOutcome::SkippedEmptyPool { window });
        };

        let created = week_selections::insert_if_absent(&self.db, song_id, &window).await?;
        let row = week_selections::find_by_window(&self.db, &window)
            .await?
            .ok_or_else(|| {
                encore_common::Error::Internal(format!(
                    "week selection for [{}, {}) missing after insert",
                    window.start, window.end
                ))
            })?;
        let selection: WeekSelection = row.try_into()?;

        if created {
            info!(
                "Song of the week selected: song_id={} for [{}, {}) from {} candidates",
                selection.song_id,
                window.start,
                window.end,
                pool.len()
            );
            Ok(SchedulerOutcome::Created(selection))
        } else {
            info!(
                "Concurrent scheduler selected song_id={} for [{}, {}) first",
                selection.song_id, window.start, window.end
            );
            Ok(SchedulerOutcome::AlreadyPresent(selection))
        }
    }
}

/// Uniform choice from the eligible pool
fn pick_song(pool: &[SongId]) -> Option<SongId> {
    let mut rng = rand::thread_rng();
    pool.choose(&mut rng).copied()
}
