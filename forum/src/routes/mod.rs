pub mod accounts;
pub mod admin;
pub mod channels;
pub mod posts;
pub mod search;
pub mod stats;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    middleware,
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::require_auth;
use crate::health;
use crate::state::SharedState;

/// Response to a successful create
#[derive(Debug, Serialize)]
pub struct Created {
    pub success: bool,
    pub id: String,
}

impl Created {
    pub fn new(id: String) -> Self {
        Self { success: true, id }
    }
}

/// Assemble every route with its middleware
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(state.config.cors_origin.clone())
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::check_health))
        .merge(accounts::public_routes())
        .merge(posts::public_routes())
        .merge(channels::public_routes())
        .merge(search::routes())
        .merge(stats::routes());

    // Protected routes (bearer token required)
    let protected_routes = Router::new()
        .merge(accounts::protected_routes())
        .merge(posts::protected_routes())
        .merge(channels::protected_routes())
        .merge(admin::protected_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(state.config.body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
