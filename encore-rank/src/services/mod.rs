//! Ranking and weekly-song services

pub mod keyed_lock;
pub mod rank_query;
pub mod ranking_updater;
pub mod session_intake;
pub mod timer;
pub mod week_song_scheduler;
pub mod weekly_leaderboard;

pub use rank_query::Metric;
pub use ranking_updater::RankingUpdater;
pub use session_intake::{submit_session, SessionSubmission};
pub use timer::{spawn_periodic, WeeklyTrigger};
pub use week_song_scheduler::{SchedulerOutcome, SchedulerState, WeekSelection, WeeklySongScheduler};
pub use weekly_leaderboard::WeeklyLeaderboard;
