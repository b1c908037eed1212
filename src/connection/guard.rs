// src/connection/guard.rs

//! Defines `ConnectionGuard`, an RAII guard for connection resource management.

use crate::core::metrics;
use crate::core::protocol::messages;
use crate::core::state::ServerState;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info};

/// An RAII guard that runs a connection's cleanup exactly once, whichever way
/// the handler's scope is exited (EOF, transport error, eviction, panic).
pub struct ConnectionGuard {
    /// A shared reference to the server state.
    pub(crate) state: Arc<ServerState>,
    /// The unique identifier for the client session.
    pub(crate) session_id: u64,
    /// The network address of the client.
    pub(crate) addr: SocketAddr,
    /// Set once the handshake admits the session into the registry.
    pub(crate) username: Option<String>,
}

impl ConnectionGuard {
    /// Creates a new `ConnectionGuard` for a connection still in its handshake.
    pub(crate) fn new(state: Arc<ServerState>, session_id: u64, addr: SocketAddr) -> Self {
        Self {
            state,
            session_id,
            addr,
            username: None,
        }
    }

    /// Marks the session as active under `username`; from now on dropping the
    /// guard removes it from the registry and announces the departure.
    pub(crate) fn set_active(&mut self, username: &str) {
        self.username = Some(username.to_string());
    }
}

impl Drop for ConnectionGuard {
    /// Removes the session from the registry, then tells everyone else it left.
    fn drop(&mut self) {
        metrics::CONNECTED_CLIENTS.dec();

        let Some(username) = self.username.take() else {
            debug!(
                "Connection {} (session {}) closed before completing the handshake.",
                self.addr, self.session_id
            );
            return;
        };

        if self.state.registry.remove(self.session_id).is_none() {
            debug!(
                "Session {} was already evicted from the registry upon cleanup.",
                self.session_id
            );
        }

        let notice = messages::left_notice(&username);
        self.state.registry.broadcast(&notice, self.session_id);
        info!("{}", notice);
    }
}
