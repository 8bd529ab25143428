//! Shared fixtures for encore-rank integration tests
#![allow(dead_code)]

use axum::body::Body;
use axum::http::Request;
use encore_common::config::ServiceConfig;
use encore_common::db::{init_database, Song, User, UserId, SongId};
use encore_rank::db::{songs, users};
use encore_rank::{build_router, AppState};
use serde_json::Value;
use sqlx::SqlitePool;
use tempfile::TempDir;

/// Fresh database in a temp folder
///
/// Returns (TempDir, SqlitePool) - TempDir must be kept alive for duration of test
pub async fn create_test_db() -> (TempDir, SqlitePool) {
    let temp_dir = TempDir::new().expect("Should create temp dir");
    let pool = init_database(&temp_dir.path().join("encore.db"))
        .await
        .expect("Should initialize database");
    (temp_dir, pool)
}

pub async fn add_user(pool: &SqlitePool, user_id: UserId, username: &str) {
    users::insert_user(
        pool,
        &User {
            user_id,
            username: username.to_string(),
            avatar_url: Some(format!("https://cdn.example/avatars/{}.png", user_id)),
        },
    )
    .await
    .expect("Should insert user");
}

pub async fn add_song(pool: &SqlitePool, song_id: SongId, title: &str) {
    songs::insert_song(
        pool,
        &Song {
            song_id,
            title: title.to_string(),
            image_url: None,
            writer: Some("Czerny".to_string()),
        },
    )
    .await
    .expect("Should insert song");
}

pub fn test_state(pool: SqlitePool) -> AppState {
    AppState::new(pool, ServiceConfig::default()).expect("Default config is valid")
}

pub fn setup_app(pool: SqlitePool) -> axum::Router {
    build_router(test_state(pool))
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}
