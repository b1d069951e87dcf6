use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use forum_core::models::{Channel, RecordView};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::ValidJson;
use crate::routes::Created;
use crate::state::SharedState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateChannelRequest {
    #[serde(default)]
    #[validate(length(max = 100))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct ChannelList {
    pub channels: Vec<Channel>,
}

#[derive(Debug, Serialize)]
pub struct ChannelPosts {
    pub posts: Vec<RecordView>,
}

pub fn public_routes() -> Router<SharedState> {
    Router::new()
        .route("/channels", get(list_channels))
        .route("/channels/:id/posts", get(channel_posts))
}

pub fn protected_routes() -> Router<SharedState> {
    Router::new().route("/createchannel", post(create_channel))
}

async fn list_channels(State(state): State<SharedState>) -> ApiResult<Json<ChannelList>> {
    let channels = state.services.forum.channels().await?;
    Ok(Json(ChannelList { channels }))
}

async fn create_channel(
    State(state): State<SharedState>,
    Extension(AuthUser(identity)): Extension<AuthUser>,
    ValidJson(req): ValidJson<CreateChannelRequest>,
) -> ApiResult<Json<Created>> {
    let id = state
        .services
        .forum
        .create_channel(&identity, req.name, req.description)
        .await?;

    Ok(Json(Created::new(id)))
}

/// Posts filed under one channel, newest first
async fn channel_posts(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ChannelPosts>> {
    let posts = state.services.forum.channel_posts(&id).await?;
    Ok(Json(ChannelPosts { posts }))
}
