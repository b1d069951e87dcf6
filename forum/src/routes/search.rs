use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use forum_core::models::RecordView;
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct ContentQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AuthorQuery {
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub results: Vec<RecordView>,
}

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/search/content", get(search_content))
        .route("/search/user", get(search_user))
}

async fn search_content(
    State(state): State<SharedState>,
    Query(query): Query<ContentQuery>,
) -> ApiResult<Json<SearchResults>> {
    let results = state
        .services
        .forum
        .search_content(query.q.as_deref().unwrap_or_default())
        .await?;

    Ok(Json(SearchResults { results }))
}

async fn search_user(
    State(state): State<SharedState>,
    Query(query): Query<AuthorQuery>,
) -> ApiResult<Json<SearchResults>> {
    let results = state
        .services
        .forum
        .search_author(query.username.as_deref().unwrap_or_default())
        .await?;

    Ok(Json(SearchResults { results }))
}
