//! Session intake endpoint

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Serialize;

use crate::error::ApiResult;
use crate::services::{submit_session, SessionSubmission};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SessionCreated {
    pub session_id: i64,
}

/// POST /api/sessions
pub async fn post_session(
    State(state): State<AppState>,
    Json(submission): Json<SessionSubmission>,
) -> ApiResult<(StatusCode, Json<SessionCreated>)> {
    let session_id = submit_session(&state.updater, submission, encore_common::time::now()).await?;
    Ok((StatusCode::CREATED, Json(SessionCreated { session_id })))
}

pub fn session_routes() -> Router<AppState> {
    Router::new().route("/api/sessions", post(post_session))
}
