// src/connection/handler.rs

//! Defines the `ConnectionHandler` which manages the full lifecycle of a client connection.

use super::guard::ConnectionGuard;
use crate::core::auth::{Handshake, Negotiation};
use crate::core::metrics;
use crate::core::protocol::{
    InboundFrame, InboundLine, LineFramed, PrivateMessage, framed_lines, messages,
};
use crate::core::registry::OutboundReceiver;
use crate::core::state::ServerState;
use crate::core::ChatError;
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// Manages the full lifecycle of a client connection.
pub struct ConnectionHandler {
    framed: LineFramed<TcpStream>,
    addr: SocketAddr,
    state: Arc<ServerState>,
    session_id: u64,
}

impl ConnectionHandler {
    /// Creates a new `ConnectionHandler`.
    pub fn new(socket: TcpStream, addr: SocketAddr, state: Arc<ServerState>, session_id: u64) -> Self {
        let max_line_length = state.config.max_line_length;
        Self {
            framed: framed_lines(socket, max_line_length),
            addr,
            state,
            session_id,
        }
    }

    /// Runs the handshake and then the message loop until the peer goes away.
    ///
    /// Normal disconnects are not errors. Cleanup (registry removal and the
    /// leave notice) is done by the `ConnectionGuard` when this returns.
    pub async fn run(mut self) -> Result<(), ChatError> {
        let mut guard = ConnectionGuard::new(self.state.clone(), self.session_id, self.addr);

        let authenticator = self.state.authenticator.clone();
        let negotiation = {
            let mut handshake = Handshake::new(
                &mut self.framed,
                &self.state.registry,
                self.session_id,
                self.addr,
            );
            authenticator.negotiate(&mut handshake).await
        };

        let admission = match negotiation {
            Ok(Negotiation::Active(admission)) => admission,
            Ok(Negotiation::Rejected) => {
                info!("Connection from {} rejected during handshake.", self.addr);
                return Ok(());
            }
            Err(e) if e.is_normal_disconnect() => {
                debug!("Connection from {} closed during handshake: {}", self.addr, e);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let username = admission.username;
        guard.set_active(&username);

        let notice = messages::joined_notice(&username);
        self.state.registry.broadcast(&notice, self.session_id);
        info!("{}", notice);

        match self.message_loop(&username, admission.outbound).await {
            Err(e) if e.is_normal_disconnect() => {
                debug!("Connection from {} closed by peer: {}", self.addr, e);
                Ok(())
            }
            other => other,
        }
    }

    /// The `Active` state: relays queued lines out and processes inbound lines.
    async fn message_loop(
        &mut self,
        username: &str,
        mut outbound: OutboundReceiver,
    ) -> Result<(), ChatError> {
        loop {
            tokio::select! {
                biased;

                queued = outbound.recv() => {
                    match queued {
                        Some(line) => self.framed.send(line).await?,
                        None => {
                            info!(
                                "Session {} ('{}') was removed from the registry. Closing connection.",
                                self.session_id, username
                            );
                            return Ok(());
                        }
                    }
                }

                result = self.framed.next() => {
                    match result {
                        Some(Ok(InboundFrame::Line(line))) => self.process_line(username, &line).await?,
                        Some(Ok(InboundFrame::TooLong)) => {
                            debug!("Session {}: discarded over-long line.", self.session_id);
                            self.framed.send(messages::LINE_TOO_LONG).await?;
                        }
                        Some(Err(e)) => return Err(e),
                        None => {
                            debug!("Connection from {} closed by peer.", self.addr);
                            return Ok(());
                        }
                    }
                }
            }
        }
    }

    async fn process_line(&mut self, username: &str, line: &str) -> Result<(), ChatError> {
        match InboundLine::classify(line) {
            InboundLine::Blank => Ok(()),
            InboundLine::Chat(body) => {
                let message = messages::chat_line(&messages::timestamp(), username, body);
                info!("{}", message);
                self.state.registry.broadcast(&message, self.session_id);
                metrics::MESSAGES_BROADCAST_TOTAL.inc();
                Ok(())
            }
            InboundLine::Private(Err(e)) => {
                debug!("Session {}: rejected private message: {}", self.session_id, e);
                self.framed.send(messages::INVALID_PRIVATE_FORMAT).await?;
                Ok(())
            }
            InboundLine::Private(Ok(private)) => self.deliver_private(username, private).await,
        }
    }

    /// Delivers a private message only if every recipient is online.
    ///
    /// Each unknown name is reported to the sender. If any name is unknown
    /// nobody receives the body.
    async fn deliver_private(
        &mut self,
        username: &str,
        private: PrivateMessage,
    ) -> Result<(), ChatError> {
        let mut resolved = Vec::with_capacity(private.recipients.len());
        let mut missing = Vec::new();
        for name in &private.recipients {
            match self.state.registry.find_by_username(name) {
                Some(handle) => resolved.push(handle),
                None => missing.push(name.as_str()),
            }
        }

        if !missing.is_empty() {
            for name in missing {
                self.framed.send(messages::user_not_found(name)).await?;
            }
            return Ok(());
        }

        let time = messages::timestamp();
        let delivery = messages::private_delivery(&time, username, &private.body);
        for recipient in &resolved {
            if !recipient.send(delivery.as_str()) {
                warn!(
                    "Private message from '{}' to '{}' was lost: recipient disconnected.",
                    username, recipient.username
                );
            }
        }
        metrics::PRIVATE_MESSAGES_TOTAL.inc();

        self.framed
            .send(messages::private_confirmation(&time, &private.recipients, &private.body))
            .await?;
        Ok(())
    }
}
