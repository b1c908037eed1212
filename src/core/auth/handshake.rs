// src/core/auth/handshake.rs

use crate::core::errors::ChatError;
use crate::core::protocol::{InboundFrame, LineFramed, messages};
use crate::core::registry::{OutboundReceiver, SessionHandle, SessionRegistry};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use tokio::net::TcpStream;
use tracing::debug;

/// A session that made it into the registry.
#[derive(Debug)]
pub struct Admission {
    pub username: String,
    /// Lines other sessions queued for this one.
    pub outbound: OutboundReceiver,
}

/// Per-connection context handed to an `Authenticator`.
pub struct Handshake<'a> {
    framed: &'a mut LineFramed<TcpStream>,
    registry: &'a SessionRegistry,
    session_id: u64,
    addr: SocketAddr,
}

impl<'a> Handshake<'a> {
    pub fn new(
        framed: &'a mut LineFramed<TcpStream>,
        registry: &'a SessionRegistry,
        session_id: u64,
        addr: SocketAddr,
    ) -> Self {
        Self {
            framed,
            registry,
            session_id,
            addr,
        }
    }

    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Reads the next line verbatim. Over-long lines are answered with a
    /// notice and skipped.
    pub async fn read_line(&mut self) -> Result<String, ChatError> {
        loop {
            match self.framed.next().await {
                Some(Ok(InboundFrame::Line(line))) => return Ok(line),
                Some(Ok(InboundFrame::TooLong)) => self.send_line(messages::LINE_TOO_LONG).await?,
                Some(Err(e)) => return Err(e),
                None => return Err(ChatError::ConnectionClosed),
            }
        }
    }

    /// Reads lines until one is not blank and returns it trimmed.
    pub async fn read_username(&mut self) -> Result<String, ChatError> {
        loop {
            let line = self.read_line().await?;
            let name = line.trim();
            if !name.is_empty() {
                return Ok(name.to_string());
            }
        }
    }

    pub async fn send_line(&mut self, line: &str) -> Result<(), ChatError> {
        self.framed.send(line).await?;
        Ok(())
    }

    /// Attempts to admit the session as `username`.
    ///
    /// On success the session is in the registry and the client has received
    /// `Welcome` followed by the online listing. If the name is held by an
    /// active session the client receives `NameTaken` and `None` is returned,
    /// so the caller can restart its handshake.
    pub async fn finish(&mut self, username: String) -> Result<Option<Admission>, ChatError> {
        let (handle, outbound) = SessionHandle::new(self.session_id, username.clone(), self.addr);
        if let Err(e) = self.registry.try_add(handle) {
            debug!("Session {}: {}", self.session_id, e);
            self.send_line(messages::NAME_TAKEN).await?;
            return Ok(None);
        }

        let others = self.registry.usernames_except(self.session_id);
        let greeting = async {
            self.framed.send(messages::WELCOME).await?;
            self.framed.send(messages::online_listing(&others)).await?;
            Ok::<(), ChatError>(())
        };
        if let Err(e) = greeting.await {
            // Admitted but never announced; leave no trace in the registry.
            self.registry.remove(self.session_id);
            return Err(e);
        }

        Ok(Some(Admission { username, outbound }))
    }
}
