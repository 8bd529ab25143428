//! Song-of-the-week rotation and settled weekly leaderboard

mod helpers;

use chrono::{TimeZone, Utc};
use encore_common::time::{utc_offset, WeekWindow};
use encore_rank::db::sessions::{self, NewSession};
use encore_rank::db::week_selections;
use encore_rank::services::{SchedulerOutcome, WeeklyLeaderboard, WeeklySongScheduler};
use helpers::*;

fn scheduler(pool: &sqlx::SqlitePool) -> WeeklySongScheduler {
    WeeklySongScheduler::new(pool.clone(), utc_offset(0).unwrap(), 15)
}

#[tokio::test]
async fn test_double_trigger_creates_one_selection() {
    let (_dir, pool) = create_test_db().await;
    for song_id in [3, 16, 17, 18] {
        add_song(&pool, song_id, &format!("Song {}", song_id)).await;
    }

    // Monday 2024-06-03, so the target week is [2024-06-10, 2024-06-17)
    let trigger = Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 0).unwrap();
    let sched = scheduler(&pool);
    let first = sched.run_once(trigger).await.unwrap();
    let second = sched.run_once(trigger).await.unwrap();

    let SchedulerOutcome::Created(created) = first else {
        panic!("first run should create, got {:?}", first);
    };
    assert_eq!(created.window.start, Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap());
    assert_eq!(created.window.end, Utc.with_ymd_and_hms(2024, 6, 17, 0, 0, 0).unwrap());
    assert_eq!(second, SchedulerOutcome::AlreadyPresent(created));
    assert_eq!(week_selections::count(&pool).await.unwrap(), 1);
}

#[tokio::test]
async fn test_reserved_songs_never_selected() {
    let (_dir, pool) = create_test_db().await;
    for song_id in 1..=15 {
        add_song(&pool, song_id, "Drill").await;
    }
    add_song(&pool, 16, "Sonatina").await;

    let mut monday = Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 0).unwrap();
    for _ in 0..5 {
        let outcome = scheduler(&pool).run_once(monday).await.unwrap();
        assert_eq!(outcome.selection().unwrap().song_id, 16);
        monday += chrono::Duration::weeks(1);
    }
    assert_eq!(week_selections::count(&pool).await.unwrap(), 5);
}

#[tokio::test]
async fn test_empty_pool_keeps_previous_song_visible() {
    let (_dir, pool) = create_test_db().await;
    add_song(&pool, 5, "Drill").await;
    add_song(&pool, 16, "Sonatina").await;

    let offset = utc_offset(0).unwrap();
    let week1 = WeekWindow::containing(Utc.with_ymd_and_hms(2024, 6, 5, 0, 0, 0).unwrap(), offset);
    week_selections::insert_if_absent(&pool, 16, &week1).await.unwrap();

    // Every song is reserved, so the pool for the following week is empty
    let only_drills = WeeklySongScheduler::new(pool.clone(), offset, 20);
    let outcome = only_drills.run_once(week1.start).await.unwrap();
    assert!(matches!(outcome, SchedulerOutcome::SkippedEmptyPool { .. }));

    let board = WeeklyLeaderboard::new(pool.clone(), offset, 10);
    let in_week2 = week1.end + chrono::Duration::days(2);
    let song = board.current_week_song(in_week2).await.unwrap();
    assert_eq!(song.song_id, 16);
}

#[tokio::test]
async fn test_weekly_board_keeps_best_score_per_user() {
    let (_dir, pool) = create_test_db().await;
    add_user(&pool, 1, "alice").await;
    add_user(&pool, 2, "bob").await;
    add_user(&pool, 3, "carol").await;
    add_song(&pool, 20, "Etude").await;
    add_song(&pool, 21, "Other").await;

    let offset = utc_offset(0).unwrap();
    let now = Utc.with_ymd_and_hms(2024, 6, 12, 12, 0, 0).unwrap();
    let current = WeekWindow::containing(now, offset);
    week_selections::insert_if_absent(&pool, 20, &current).await.unwrap();

    let last_week = current.preceding();
    let t = |h: i64| (last_week.start + chrono::Duration::hours(h)).timestamp();
    let rows = [
        (1, 20, 70, t(1)),
        (1, 20, 92, t(5)),
        (2, 20, 92, t(3)),  // bob reached 92 before alice
        (3, 20, 60, t(2)),
        (3, 21, 100, t(2)), // other song
        (3, 20, 99, last_week.start.timestamp() - 1), // before the window
    ];
    for (user_id, song_id, score, practiced_at) in rows {
        sessions::insert(
            &pool,
            &NewSession {
                user_id,
                song_id,
                score,
                duration_secs: 60,
                mode: String::new(),
                practiced_at,
            },
        )
        .await
        .unwrap();
    }

    let board = WeeklyLeaderboard::new(pool.clone(), offset, 10);
    let response = board.weekly_leaderboard(now).await;
    assert_eq!(response.song.unwrap().song_id, 20);

    let summary: Vec<(i64, &str, i64)> = response
        .entries
        .iter()
        .map(|e| (e.rank, e.username.as_str(), e.score))
        .collect();
    assert_eq!(summary, vec![(1, "bob", 92), (1, "alice", 92), (3, "carol", 60)]);
}

#[tokio::test]
async fn test_window_boundaries_are_half_open() {
    let (_dir, pool) = create_test_db().await;
    add_user(&pool, 1, "alice").await;
    add_user(&pool, 2, "bob").await;
    add_song(&pool, 20, "Etude").await;

    let offset = utc_offset(0).unwrap();
    let now = Utc.with_ymd_and_hms(2024, 6, 12, 12, 0, 0).unwrap();
    let current = WeekWindow::containing(now, offset);
    week_selections::insert_if_absent(&pool, 20, &current).await.unwrap();
    let last_week = current.preceding();

    // Start is inside the window, end is not
    for (user_id, practiced_at) in [(1, last_week.start_unix()), (2, last_week.end_unix())] {
        sessions::insert(
            &pool,
            &NewSession {
                user_id,
                song_id: 20,
                score: 50,
                duration_secs: 10,
                mode: String::new(),
                practiced_at,
            },
        )
        .await
        .unwrap();
    }

    let entries = WeeklyLeaderboard::new(pool.clone(), offset, 10)
        .weekly_leaderboard(now)
        .await
        .entries;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].username, "alice");
}
