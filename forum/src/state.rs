use std::sync::Arc;

use forum_core::{ServiceRegistry, StoreHandle};

use crate::auth::TokenIssuer;
use crate::config::AppConfig;

/// Shared application state across all routes and services
pub struct AppState {
    /// Domain services
    pub services: ServiceRegistry,

    /// Record store, kept for health checks
    pub store: StoreHandle,

    /// Access token issuer
    pub tokens: TokenIssuer,

    pub config: AppConfig,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(store: StoreHandle, config: AppConfig) -> Self {
        let services = ServiceRegistry::new(store.clone(), config.admin_users.iter().cloned());
        let tokens = TokenIssuer::new(&config.jwt_secret, config.token_ttl);

        Self {
            services,
            store,
            tokens,
            config,
        }
    }
}
