// src/core/auth/password.rs

use super::{Authenticator, Handshake, Negotiation};
use crate::core::credentials::CredentialStore;
use crate::core::errors::ChatError;
use crate::core::metrics;
use crate::core::protocol::messages;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Username + password handshake backed by the credential store.
///
/// A registered name is challenged for its password; an unknown name is
/// prompted for one and registered on the spot.
#[derive(Debug)]
pub struct PasswordAuthenticator {
    store: Arc<CredentialStore>,
    max_attempts: u32,
}

/// What happened to a username once its password line was handled.
enum PasswordOutcome {
    Accepted,
    /// The name was claimed concurrently; restart from the username.
    Retry,
    LockedOut,
}

impl PasswordAuthenticator {
    pub fn new(store: Arc<CredentialStore>, max_attempts: u32) -> Self {
        Self {
            store,
            max_attempts: max_attempts.max(1),
        }
    }

    async fn challenge(
        &self,
        handshake: &mut Handshake<'_>,
        username: &str,
    ) -> Result<PasswordOutcome, ChatError> {
        let mut failures = 0;
        loop {
            let password = handshake.read_line().await?;
            if self.store.verify(username, &password) {
                return Ok(PasswordOutcome::Accepted);
            }

            failures += 1;
            metrics::AUTH_FAILURES_TOTAL.inc();
            if failures >= self.max_attempts {
                warn!(
                    "Session {} from {}: {} wrong passwords for '{}'. Disconnecting.",
                    handshake.session_id(),
                    handshake.addr(),
                    failures,
                    username
                );
                return Ok(PasswordOutcome::LockedOut);
            }
            handshake.send_line(messages::INCORRECT_PASSWORD).await?;
        }
    }

    async fn enroll(
        &self,
        handshake: &mut Handshake<'_>,
        username: &str,
    ) -> Result<PasswordOutcome, ChatError> {
        handshake.send_line(messages::PASSWORD_PROMPT).await?;
        let password = handshake.read_line().await?;

        let store = self.store.clone();
        let name = username.to_string();
        let result = tokio::task::spawn_blocking(move || store.register(&name, &password)).await?;
        match result {
            Ok(()) => {
                metrics::REGISTRATIONS_TOTAL.inc();
                info!(
                    "Session {}: registered new account '{}'.",
                    handshake.session_id(),
                    username
                );
                Ok(PasswordOutcome::Accepted)
            }
            Err(ChatError::AlreadyRegistered(_)) => {
                handshake.send_line(messages::NAME_TAKEN).await?;
                Ok(PasswordOutcome::Retry)
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl Authenticator for PasswordAuthenticator {
    async fn negotiate(&self, handshake: &mut Handshake<'_>) -> Result<Negotiation, ChatError> {
        loop {
            let username = handshake.read_username().await?;
            let outcome = if self.store.contains(&username) {
                self.challenge(handshake, &username).await?
            } else {
                self.enroll(handshake, &username).await?
            };

            match outcome {
                PasswordOutcome::Accepted => {
                    if let Some(admission) = handshake.finish(username).await? {
                        return Ok(Negotiation::Active(admission));
                    }
                }
                PasswordOutcome::Retry => {}
                PasswordOutcome::LockedOut => return Ok(Negotiation::Rejected),
            }
        }
    }
}
