use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::state::SharedState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status of the service: "ok" or "degraded"
    pub status: String,

    /// Whether the record store answered
    pub store_connection: bool,

    pub version: String,
}

/// Check the health of the API and its record store
pub async fn check_health(State(state): State<SharedState>) -> impl IntoResponse {
    let store_connection = match state.store.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Health check could not reach the record store");
            false
        }
    };

    let health = HealthResponse {
        status: if store_connection { "ok" } else { "degraded" }.to_string(),
        store_connection,
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let status = if store_connection {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(health))
}
