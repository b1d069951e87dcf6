use axum::{extract::State, routing::get, Json, Router};
use forum_core::{LeaderboardEntry, PostingExtremes};
use serde::Serialize;

use crate::error::ApiResult;
use crate::state::SharedState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopUsers {
    pub top_by_posts: Vec<LeaderboardEntry>,
}

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/stats/most-posts", get(most_posts))
        .route("/stats/top-users", get(top_users))
}

async fn most_posts(State(state): State<SharedState>) -> ApiResult<Json<PostingExtremes>> {
    Ok(Json(state.services.forum.posting_extremes().await?))
}

async fn top_users(State(state): State<SharedState>) -> ApiResult<Json<TopUsers>> {
    let top_by_posts = state.services.forum.leaderboard().await?;
    Ok(Json(TopUsers { top_by_posts }))
}
