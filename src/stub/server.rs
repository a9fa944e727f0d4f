use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use super::api::{self, AppState};
use super::store::{StoreHandle, StubStore};

/// Configuration for the stub backend.
#[derive(Debug, Clone)]
pub struct StubServerConfig {
    pub port: u16,
    /// Permissive CORS and bind on all interfaces.
    pub dev_mode: bool,
    /// Refuse every move with 409 Conflict.
    pub reject_moves: bool,
    /// Start empty instead of with the demo project.
    pub empty: bool,
}

impl Default for StubServerConfig {
    fn default() -> Self {
        Self {
            port: 3141,
            dev_mode: false,
            reject_moves: false,
            empty: false,
        }
    }
}

pub fn build_router(store: StoreHandle) -> Router {
    api::api_router().with_state(Arc::new(AppState { store }))
}

/// Serve `store` on an already bound listener until the task is dropped.
pub async fn serve(listener: TcpListener, store: StoreHandle) -> Result<()> {
    axum::serve(listener, build_router(store))
        .await
        .context("Stub server error")
}

/// Bind an ephemeral localhost port and serve `store` in the background.
pub async fn spawn(store: StoreHandle) -> Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .context("Failed to bind stub server")?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(err) = serve(listener, store).await {
            warn!(error = %err, "stub server stopped");
        }
    });
    Ok(addr)
}

/// Run the stub backend in the foreground until Ctrl+C.
pub async fn start_server(config: StubServerConfig) -> Result<()> {
    let mut seed = if config.empty {
        let mut store = StubStore::new();
        store.add_project(1);
        store
    } else {
        StubStore::demo()
    };
    if config.reject_moves {
        seed.fail_moves(u32::MAX);
    }

    let mut app = build_router(StoreHandle::new(seed));
    if config.dev_mode {
        app = app.layer(CorsLayer::permissive());
    }

    let host = if config.dev_mode { "0.0.0.0" } else { "127.0.0.1" };
    let addr = format!("{}:{}", host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    info!(%local_addr, reject_moves = config.reject_moves, "stub backend listening");
    println!("Taskboard stub backend running at http://{}", local_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    println!("Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    println!("\nShutting down...");
}
