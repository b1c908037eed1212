// src/core/errors.rs

//! Defines the primary error type for the chat relay.

use std::sync::Arc;
use thiserror::Error;

/// The main error enum, representing all failures a session or the server can hit.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("IO Error: {0}")]
    Io(Arc<std::io::Error>),

    /// The peer closed the connection before the handshake finished.
    #[error("Connection closed by peer")]
    ConnectionClosed,

    #[error("Username '{0}' is already in use")]
    NameTaken(String),

    #[error("Username '{0}' is already registered")]
    AlreadyRegistered(String),

    #[error("Persistence Error: {0}")]
    Persistence(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

// `std::io::Error` is not cloneable, so it is shared behind an Arc.
impl Clone for ChatError {
    fn clone(&self) -> Self {
        match self {
            ChatError::Io(e) => ChatError::Io(Arc::clone(e)),
            ChatError::ConnectionClosed => ChatError::ConnectionClosed,
            ChatError::NameTaken(s) => ChatError::NameTaken(s.clone()),
            ChatError::AlreadyRegistered(s) => ChatError::AlreadyRegistered(s.clone()),
            ChatError::Persistence(s) => ChatError::Persistence(s.clone()),
            ChatError::Internal(s) => ChatError::Internal(s.clone()),
        }
    }
}

impl PartialEq for ChatError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ChatError::Io(e1), ChatError::Io(e2)) => e1.kind() == e2.kind(),
            (ChatError::NameTaken(s1), ChatError::NameTaken(s2)) => s1 == s2,
            (ChatError::AlreadyRegistered(s1), ChatError::AlreadyRegistered(s2)) => s1 == s2,
            (ChatError::Persistence(s1), ChatError::Persistence(s2)) => s1 == s2,
            (ChatError::Internal(s1), ChatError::Internal(s2)) => s1 == s2,
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

impl ChatError {
    /// True for errors that simply mean the peer went away.
    pub fn is_normal_disconnect(&self) -> bool {
        match self {
            ChatError::ConnectionClosed => true,
            ChatError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::ConnectionAborted
            ),
            _ => false,
        }
    }
}

// --- From trait implementations for easy error conversion ---

impl From<std::io::Error> for ChatError {
    fn from(e: std::io::Error) -> Self {
        ChatError::Io(Arc::new(e))
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(e: serde_json::Error) -> Self {
        ChatError::Persistence(format!("JSON error: {e}"))
    }
}

impl From<tokio::task::JoinError> for ChatError {
    fn from(e: tokio::task::JoinError) -> Self {
        ChatError::Internal(format!("Blocking task failed: {e}"))
    }
}
