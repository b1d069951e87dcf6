use axum::{
    extract::{Path, State},
    routing::delete,
    Extension, Json, Router,
};
use serde::Serialize;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub success: bool,
}

pub fn protected_routes() -> Router<SharedState> {
    Router::new().route("/admin/delete/:id", delete(delete_document))
}

/// Remove a post, reply, channel or account. Replies under a deleted post are kept.
async fn delete_document(
    State(state): State<SharedState>,
    Extension(AuthUser(identity)): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Deleted>> {
    state.services.forum.delete(&identity, &id).await?;
    Ok(Json(Deleted { success: true }))
}
