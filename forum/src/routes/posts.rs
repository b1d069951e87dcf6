use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use forum_core::models::VoteChoice;
use forum_core::services::{NewPost, NewReply, RecordSet};
use forum_core::ThreadView;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::ValidJson;
use crate::routes::Created;
use crate::state::SharedState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[serde(default)]
    #[validate(length(max = 300))]
    pub topic: String,
    #[serde(default)]
    #[validate(length(max = 20000))]
    pub data: String,
    #[serde(default)]
    pub channel_id: String,
    pub image: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReplyRequest {
    #[serde(default)]
    pub parent_id: String,
    #[serde(default)]
    #[validate(length(max = 20000))]
    pub data: String,
    pub image: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RateRequest {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub id: String,
    #[serde(default)]
    pub vote: String,
}

#[derive(Debug, Serialize)]
pub struct RateResponse {
    pub success: bool,
    pub upvotes: u32,
    pub downvotes: u32,
}

pub fn public_routes() -> Router<SharedState> {
    Router::new()
        .route("/alldata", get(all_data))
        .route("/posts/:id/thread", get(thread))
}

pub fn protected_routes() -> Router<SharedState> {
    Router::new()
        .route("/postmessage", post(create_post))
        .route("/postresponse", post(create_reply))
        .route("/rate", post(rate))
}

async fn create_post(
    State(state): State<SharedState>,
    Extension(AuthUser(identity)): Extension<AuthUser>,
    ValidJson(req): ValidJson<CreatePostRequest>,
) -> ApiResult<Json<Created>> {
    let id = state
        .services
        .forum
        .create_post(
            &identity,
            NewPost {
                topic: req.topic,
                body: req.data,
                channel_id: req.channel_id,
                attachment_ref: req.image,
            },
        )
        .await?;

    Ok(Json(Created::new(id)))
}

async fn create_reply(
    State(state): State<SharedState>,
    Extension(AuthUser(identity)): Extension<AuthUser>,
    ValidJson(req): ValidJson<CreateReplyRequest>,
) -> ApiResult<Json<Created>> {
    let id = state
        .services
        .forum
        .create_reply(
            &identity,
            NewReply {
                parent_ref: req.parent_id,
                body: req.data,
                attachment_ref: req.image,
            },
        )
        .await?;

    Ok(Json(Created::new(id)))
}

async fn rate(
    State(state): State<SharedState>,
    Extension(AuthUser(identity)): Extension<AuthUser>,
    ValidJson(req): ValidJson<RateRequest>,
) -> ApiResult<Json<RateResponse>> {
    let choice: VoteChoice = req.vote.parse()?;
    let tally = state
        .services
        .ledger
        .cast(&req.id, &identity.username, choice)
        .await?;

    Ok(Json(RateResponse {
        success: true,
        upvotes: tally.upvotes,
        downvotes: tally.downvotes,
    }))
}

async fn all_data(State(state): State<SharedState>) -> ApiResult<Json<RecordSet>> {
    Ok(Json(state.services.forum.all_records().await?))
}

async fn thread(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ThreadView>> {
    Ok(Json(state.services.forum.thread(&id).await?))
}
