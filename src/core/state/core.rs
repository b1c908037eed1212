// src/core/state/core.rs

//! Defines the central `ServerState` struct, holding all shared server-wide state.

use crate::config::{AuthMode, Config};
use crate::core::auth::{Authenticator, NameAuthenticator, PasswordAuthenticator};
use crate::core::credentials::CredentialStore;
use crate::core::errors::ChatError;
use crate::core::registry::SessionRegistry;
use std::sync::Arc;
use tracing::info;

/// The central struct holding all shared, server-wide state.
/// It is wrapped in an `Arc` and handed to every connection handler.
#[derive(Debug)]
pub struct ServerState {
    /// The configuration the server was started with.
    pub config: Config,
    /// Every session that has completed its handshake.
    pub registry: SessionRegistry,
    /// Registered accounts. `None` when running the name-only handshake.
    pub credentials: Option<Arc<CredentialStore>>,
    /// The handshake every new connection goes through.
    pub authenticator: Arc<dyn Authenticator>,
}

impl ServerState {
    /// Builds the shared state, loading the credential store if the configured
    /// handshake needs one. A credentials file that exists but cannot be read
    /// is a startup failure.
    pub fn initialize(config: Config) -> Result<Arc<Self>, ChatError> {
        let (credentials, authenticator): (Option<Arc<CredentialStore>>, Arc<dyn Authenticator>) =
            match config.auth.mode {
                AuthMode::Name => {
                    info!("Handshake mode: name only.");
                    (None, Arc::new(NameAuthenticator))
                }
                AuthMode::Password => {
                    let store = Arc::new(CredentialStore::load(&config.auth.credentials_file)?);
                    info!(
                        "Handshake mode: username and password ({} registered users in '{}').",
                        store.len(),
                        store.path().display()
                    );
                    let authenticator =
                        PasswordAuthenticator::new(store.clone(), config.auth.max_password_attempts);
                    (Some(store), Arc::new(authenticator))
                }
            };

        Ok(Arc::new(Self {
            config,
            registry: SessionRegistry::new(),
            credentials,
            authenticator,
        }))
    }
}
