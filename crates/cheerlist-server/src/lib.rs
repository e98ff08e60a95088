//! HTTP server: OAuth session routes, upcoming events, browser UI.
//!
//! This crate wires the Google provider into an axum application:
//! - [`SessionManager`] drives the OAuth flow for the single session
//! - [`router`] exposes the routes the browser page talks to
//! - [`serve`] binds the listener and runs until Ctrl-C
//!
//! # Example
//!
//! ```rust,no_run
//! use cheerlist_server::{ServerConfig, serve};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     serve(ServerConfig::default()).await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
mod config;
mod error;
mod handler;
mod session;
mod ui;

use std::sync::Arc;

use axum::Router;
use tracing::{info, warn};

use cheerlist_providers::google::{GoogleProvider, MemoryCredentialStore, SessionKey};

pub use config::ServerConfig;
pub use error::{AppError, AppResult, ServerError, ServerResult};
pub use handler::{AppState, EventsResponse, MessageResponse, StatusResponse, router};
pub use session::{CallbackParams, SessionManager, SessionState};
pub use ui::INDEX_HTML;

/// Builds the application with a fresh in-memory credential store.
pub fn build_app(config: &ServerConfig) -> ServerResult<Router> {
    let store = Arc::new(MemoryCredentialStore::new());
    let provider = GoogleProvider::new(config.google.clone(), store)?;
    let session = SessionManager::new(provider, SessionKey::default_user());
    Ok(router(AppState::new(session)))
}

/// Runs the server until Ctrl-C.
pub async fn serve(config: ServerConfig) -> ServerResult<()> {
    if let Err(e) = config.google.credentials() {
        warn!("{}", e.message());
    }

    let addr = config.addr()?;
    let app = build_app(&config)?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
