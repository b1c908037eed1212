// src/server/connection_loop.rs

//! Contains the main server loop for accepting connections.

use super::context::ServerContext;
use crate::connection::ConnectionHandler;
use crate::core::metrics;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// The main server loop. Accepts connections forever, running each one as an
/// independent task, and reaps finished tasks so their failures are observed.
pub async fn run(mut ctx: ServerContext) {
    let mut session_id_counter: u64 = 0;
    let mut client_tasks = JoinSet::new();

    loop {
        tokio::select! {
            Some(res) = ctx.background_tasks.join_next() => {
                match res {
                    Ok(Ok(())) => warn!("A background task finished unexpectedly without an error."),
                    Ok(Err(e)) => error!("Background task failed: {:#}", e),
                    Err(e) => error!("Background task panicked: {e:?}"),
                }
            },

            res = ctx.listener.accept() => {
                match res {
                    Ok((socket, addr)) => {
                        info!("Accepted new connection from: {}", addr);
                        metrics::CONNECTIONS_RECEIVED_TOTAL.inc();
                        metrics::CONNECTED_CLIENTS.inc();

                        session_id_counter = session_id_counter.wrapping_add(1);
                        let session_id = session_id_counter;
                        let state_clone = ctx.state.clone();

                        client_tasks.spawn(async move {
                            let handler = ConnectionHandler::new(socket, addr, state_clone, session_id);
                            if let Err(e) = handler.run().await {
                                warn!("Connection from {} terminated unexpectedly: {}", addr, e);
                            }
                        });
                    }
                    Err(e) => error!("Failed to accept connection: {}", e),
                }
            },

            Some(res) = client_tasks.join_next() => {
                if let Err(e) = res
                    && e.is_panic()
                {
                    error!("A client handler panicked: {e:?}");
                }
            },
        }
    }
}
