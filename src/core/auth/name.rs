// src/core/auth/name.rs

use super::{Authenticator, Handshake, Negotiation};
use crate::core::errors::ChatError;
use async_trait::async_trait;

/// Name-only handshake: the client keeps proposing usernames until one is
/// free among the currently online sessions.
#[derive(Debug, Default)]
pub struct NameAuthenticator;

#[async_trait]
impl Authenticator for NameAuthenticator {
    async fn negotiate(&self, handshake: &mut Handshake<'_>) -> Result<Negotiation, ChatError> {
        loop {
            let username = handshake.read_username().await?;
            if let Some(admission) = handshake.finish(username).await? {
                return Ok(Negotiation::Active(admission));
            }
        }
    }
}
