//! Dashboard rank and global top-N endpoints

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use encore_common::db::UserId;
use serde::Deserialize;

use crate::error::ApiResult;
use crate::models::{RankingInfo, TopRankingEntry, TopRankingResponse};
use crate::services::rank_query;
use crate::services::Metric;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TopQuery {
    /// Defaults to the configured leaderboard size
    pub limit: Option<usize>,
}

/// GET /api/rank/users/:user_id
pub async fn get_user_ranking(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> ApiResult<Json<RankingInfo>> {
    let info = rank_query::ranking_info(&state.db, user_id).await?;
    Ok(Json(info))
}

/// GET /api/rank/top
pub async fn get_top_rankings(State(state): State<AppState>) -> ApiResult<Json<TopRankingResponse>> {
    let top = rank_query::top_rankings(&state.db, state.config.leaderboard_size).await?;
    Ok(Json(top))
}

/// GET /api/rank/top/:metric?limit=n
pub async fn get_top_by_metric(
    State(state): State<AppState>,
    Path(metric): Path<String>,
    Query(query): Query<TopQuery>,
) -> ApiResult<Json<Vec<TopRankingEntry>>> {
    let metric: Metric = metric.parse()?;
    let limit = query.limit.unwrap_or(state.config.leaderboard_size);
    let entries = rank_query::top_n(&state.db, metric, limit).await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

pub fn ranking_routes() -> Router<AppState> {
    Router::new()
        .route("/api/rank/users/:user_id", get(get_user_ranking))
        .route("/api/rank/top", get(get_top_rankings))
        .route("/api/rank/top/:metric", get(get_top_by_metric))
}
