// src/core/auth/mod.rs

//! The connection handshake: turning an anonymous socket into an admitted session.
//!
//! Two handshakes exist and are mutually exclusive per server, chosen by
//! `auth.mode`: a name-only one (`NameAuthenticator`) and a name+password one
//! backed by the credential store (`PasswordAuthenticator`). Both drive the
//! same `Handshake` context, which owns the only path into the registry.

mod handshake;
mod name;
mod password;

pub use handshake::{Admission, Handshake};
pub use name::NameAuthenticator;
pub use password::PasswordAuthenticator;

use crate::core::errors::ChatError;
use async_trait::async_trait;

/// The result of a completed negotiation.
#[derive(Debug)]
pub enum Negotiation {
    /// The session is in the registry and may enter the message loop.
    Active(Admission),
    /// The client failed authentication and must be disconnected.
    Rejected,
}

/// A handshake strategy.
#[async_trait]
pub trait Authenticator: Send + Sync + std::fmt::Debug {
    /// Runs the handshake to completion over `handshake`.
    ///
    /// Returns `Err` only for transport failures; authentication failures are
    /// reported to the client and surface as `Negotiation::Rejected`.
    async fn negotiate(&self, handshake: &mut Handshake<'_>) -> Result<Negotiation, ChatError>;
}
