// src/server/mod.rs

use crate::config::Config;
use anyhow::Result;

mod connection_loop;
mod context;
mod initialization;
mod metrics_server;
mod spawner;

pub use context::ServerContext;
pub use initialization::setup;

/// The main server startup function, orchestrating all setup phases.
/// Runs until the process is terminated.
pub async fn run(config: Config) -> Result<()> {
    // 1. Initialize server state and bind the listener.
    let server_context = setup(config).await?;

    // 2. Accept connections forever.
    serve(server_context).await;

    Ok(())
}

/// Spawns the background tasks and runs the accept loop on an already
/// initialized context. Never returns under normal operation.
pub async fn serve(mut server_context: ServerContext) {
    spawner::spawn_all(&mut server_context);
    connection_loop::run(server_context).await;
}
