//! HTTP service for the developer forum.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod health;
pub mod routes;
pub mod state;

use std::sync::Arc;

use forum_core::store::{CouchStore, MemoryStore, TimeoutStore};
use forum_core::StoreHandle;
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

use crate::config::{AppConfig, StoreBackend};
use crate::state::AppState;

pub use routes::build_router;

/// Open the configured record store, bounded by the configured timeout
pub async fn connect_store(config: &AppConfig) -> anyhow::Result<StoreHandle> {
    let store: StoreHandle = match config.store {
        StoreBackend::Memory => {
            info!("Using in-memory record store");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::CouchDb => {
            info!(url = %config.couch_url, database = %config.couch_database, "Connecting to CouchDB");
            Arc::new(CouchStore::connect(config.couch_config()).await?)
        }
    };

    Ok(Arc::new(TimeoutStore::new(store, config.store_timeout)))
}

/// Serve the forum until a shutdown signal arrives
pub async fn start_server(config: AppConfig) -> anyhow::Result<()> {
    let addr = config.socket_addr();
    let store = connect_store(&config).await?;
    let state = Arc::new(AppState::new(store, config));
    let app = build_router(state);

    let listener = TcpListener::bind(addr).await?;
    info!("Forum running on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down");
        } else {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
