// src/client/mod.rs

//! Protocol-facing pieces of the console chat client: the remembered server
//! address, bounded connection attempts, and handshake reply classification.

use crate::core::protocol::messages;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;

/// Where the client remembers the last server it connected to.
pub const SERVER_DATA_FILE: &str = "serverData.json";

/// How long a single connection attempt may take before it counts as failed.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// The last server the client connected to successfully.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ServerData {
    #[serde(rename = "IP")]
    pub ip: String,
    #[serde(rename = "Port")]
    pub port: u16,
}

impl ServerData {
    /// Reads the saved server. `Ok(None)` when nothing was saved yet.
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let data = serde_json::from_str(&contents)
                    .with_context(|| format!("Failed to parse '{}'", path.display()))?;
                Ok(Some(data))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read '{}'", path.display())),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json).with_context(|| format!("Failed to write '{}'", path.display()))
    }
}

/// Connects to `host:port`, giving up after `timeout`.
///
/// A refused, unreachable, or timed-out attempt is `None`, not an error.
pub async fn connect_with_timeout(host: &str, port: u16, timeout: Duration) -> Option<TcpStream> {
    match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(stream)) => Some(stream),
        Ok(Err(e)) => {
            debug!("Connection to {}:{} failed: {}", host, port, e);
            None
        }
        Err(_) => {
            debug!("Connection to {}:{} timed out after {:?}", host, port, timeout);
            None
        }
    }
}

/// A server line received while the handshake is still in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeReply {
    Welcome,
    NameTaken,
    IncorrectPassword,
    PasswordPrompt,
    Other(String),
}

impl HandshakeReply {
    pub fn classify(line: &str) -> Self {
        match line {
            messages::WELCOME => HandshakeReply::Welcome,
            messages::NAME_TAKEN => HandshakeReply::NameTaken,
            messages::INCORRECT_PASSWORD => HandshakeReply::IncorrectPassword,
            messages::PASSWORD_PROMPT => HandshakeReply::PasswordPrompt,
            other => HandshakeReply::Other(other.to_string()),
        }
    }
}
