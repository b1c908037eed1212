// src/server/initialization.rs

//! Handles server initialization: shared state, credential loading and the listener.

use super::context::ServerContext;
use crate::config::{AuthMode, Config};
use crate::core::state::ServerState;
use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Initializes all server components before starting the main loop.
///
/// Fails if the credentials file is unreadable or the port cannot be bound;
/// the server never starts in a half-initialized state.
pub async fn setup(config: Config) -> Result<ServerContext> {
    log_startup_info(&config);

    let state = ServerState::initialize(config).context("Failed to initialize server state")?;
    info!("Server state initialized.");

    let listener = TcpListener::bind((state.config.host.as_str(), state.config.port))
        .await
        .with_context(|| {
            format!(
                "Failed to bind {}:{}",
                state.config.host, state.config.port
            )
        })?;
    info!(
        "Chat relay listening on {}",
        listener.local_addr().context("Listener has no local address")?
    );

    Ok(ServerContext {
        state,
        listener,
        background_tasks: JoinSet::new(),
    })
}

fn log_startup_info(config: &Config) {
    info!(
        "Starting chatrelay v{} (pid {}).",
        env!("CARGO_PKG_VERSION"),
        std::process::id()
    );
    if config.auth.mode == AuthMode::Password {
        warn!(
            "Passwords are stored and compared in plain text in '{}'. Do not reuse real passwords.",
            config.auth.credentials_file
        );
    }
}
