use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use forum_core::models::{Role, UserProfile};
use forum_core::services::{ProfileUpdate, Registration};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::ValidJson;
use crate::routes::Created;
use crate::state::SharedState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 64))]
    pub username: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub password: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 100))]
    pub display_name: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub username: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub display_name: String,
    pub avatar: Option<String>,
    pub role: Role,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    #[validate(length(max = 100))]
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    #[validate(length(max = 64))]
    pub skill_level: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountResponse {
    pub success: bool,
    pub display_name: String,
    pub avatar: Option<String>,
    pub skill_level: Option<String>,
}

pub fn public_routes() -> Router<SharedState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/user/:username", get(user_profile))
}

pub fn protected_routes() -> Router<SharedState> {
    Router::new().route("/account/update", post(update_account))
}

async fn register(
    State(state): State<SharedState>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> ApiResult<Json<Created>> {
    let profile = state
        .services
        .accounts
        .register(Registration {
            username: req.username,
            password: req.password,
            display_name: req.display_name,
            avatar: req.avatar,
        })
        .await?;

    Ok(Json(Created::new(profile.username)))
}

async fn login(
    State(state): State<SharedState>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user = state
        .services
        .accounts
        .authenticate(&req.username, &req.password)
        .await?;
    let token = state.tokens.issue(&user.identity())?;

    info!(username = %user.username, "User logged in");
    Ok(Json(LoginResponse {
        token,
        display_name: user.display_name,
        avatar: user.avatar,
        role: user.role,
    }))
}

async fn update_account(
    State(state): State<SharedState>,
    Extension(AuthUser(identity)): Extension<AuthUser>,
    ValidJson(req): ValidJson<UpdateAccountRequest>,
) -> ApiResult<Json<UpdateAccountResponse>> {
    let profile = state
        .services
        .accounts
        .update_profile(
            &identity.username,
            ProfileUpdate {
                display_name: req.display_name,
                avatar: req.avatar,
                skill_level: req.skill_level,
            },
        )
        .await?;

    Ok(Json(UpdateAccountResponse {
        success: true,
        display_name: profile.display_name,
        avatar: profile.avatar,
        skill_level: profile.skill_level,
    }))
}

async fn user_profile(
    State(state): State<SharedState>,
    Path(username): Path<String>,
) -> ApiResult<Json<UserProfile>> {
    Ok(Json(state.services.accounts.profile(&username).await?))
}
