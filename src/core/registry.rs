// src/core/registry.rs

//! The shared table of active (authenticated) chat sessions.
//!
//! Every operation takes the registry lock exactly once, so a check-then-insert
//! (`try_add`) can never interleave with another session's admission. The lock
//! is a synchronous `parking_lot::Mutex` and is never held across an `.await`:
//! outbound delivery is a non-blocking channel send.

use crate::core::errors::ChatError;
use crate::core::metrics;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::sync::mpsc;
use tracing::debug;

/// Sender half of a session's outbound line queue.
pub type OutboundSender = mpsc::UnboundedSender<String>;
/// Receiver half, drained to the socket by the owning connection task.
pub type OutboundReceiver = mpsc::UnboundedReceiver<String>;

/// The registry's view of one active session.
///
/// The registry only ever writes into `outbound`. When the entry is removed the
/// sender is dropped, the owning task sees its queue close, and it shuts the
/// transport down.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub id: u64,
    pub username: String,
    pub addr: SocketAddr,
    outbound: OutboundSender,
}

impl SessionHandle {
    /// Creates a handle together with the receiver the owning task should drain.
    pub fn new(id: u64, username: String, addr: SocketAddr) -> (Self, OutboundReceiver) {
        let (outbound, rx) = mpsc::unbounded_channel();
        (
            Self {
                id,
                username,
                addr,
                outbound,
            },
            rx,
        )
    }

    /// Queues one line for this session. Returns false if the session is gone.
    pub fn send(&self, line: impl Into<String>) -> bool {
        self.outbound.send(line.into()).is_ok()
    }
}

/// The process-wide set of active sessions, keyed by session id.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<u64, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits `handle` if no active session holds its username.
    ///
    /// This is the only admission path used by the handshake: the uniqueness
    /// check and the insert happen under a single lock acquisition.
    pub fn try_add(&self, handle: SessionHandle) -> Result<(), ChatError> {
        let mut sessions = self.sessions.lock();
        if sessions.values().any(|s| s.username == handle.username) {
            return Err(ChatError::NameTaken(handle.username));
        }
        debug!(
            "Session {} admitted as '{}'.",
            handle.id, handle.username
        );
        sessions.insert(handle.id, handle);
        metrics::ACTIVE_SESSIONS.set(sessions.len() as f64);
        Ok(())
    }

    /// Inserts `handle` without a uniqueness check. The caller must already
    /// have established that the username is free; prefer `try_add`.
    pub fn add(&self, handle: SessionHandle) {
        let mut sessions = self.sessions.lock();
        sessions.insert(handle.id, handle);
        metrics::ACTIVE_SESSIONS.set(sessions.len() as f64);
    }

    pub fn username_taken(&self, username: &str) -> bool {
        self.sessions
            .lock()
            .values()
            .any(|s| s.username == username)
    }

    pub fn find_by_username(&self, username: &str) -> Option<SessionHandle> {
        self.sessions
            .lock()
            .values()
            .find(|s| s.username == username)
            .cloned()
    }

    /// Usernames of every active session except `id`, sorted for a stable listing.
    pub fn usernames_except(&self, id: u64) -> Vec<String> {
        let mut names: Vec<String> = self
            .sessions
            .lock()
            .values()
            .filter(|s| s.id != id)
            .map(|s| s.username.clone())
            .collect();
        names.sort();
        names
    }

    /// Removes the session with `id`, closing its outbound queue and with it
    /// the owning task's transport. Removing an absent id is a no-op.
    pub fn remove(&self, id: u64) -> Option<SessionHandle> {
        let mut sessions = self.sessions.lock();
        let removed = sessions.remove(&id);
        metrics::ACTIVE_SESSIONS.set(sessions.len() as f64);
        removed
    }

    /// Sends `message` to every active session except `exclude_id`.
    ///
    /// Delivery is best-effort per recipient: a closed queue is logged and
    /// skipped. Returns how many sessions accepted the line.
    pub fn broadcast(&self, message: &str, exclude_id: u64) -> usize {
        let sessions = self.sessions.lock();
        let mut delivered = 0;
        for session in sessions.values().filter(|s| s.id != exclude_id) {
            if session.send(message) {
                delivered += 1;
            } else {
                debug!(
                    "Dropping broadcast to session {} ('{}'): queue closed.",
                    session.id, session.username
                );
            }
        }
        delivered
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}
