// src/core/credentials.rs

//! The persisted username -> password mapping used by the password handshake.
//!
//! The whole mapping is read once at startup and rewritten in full after every
//! registration, through a temp file and an atomic rename.

use crate::core::errors::ChatError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// On-disk layout of the credentials file.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct CredentialsFile {
    #[serde(default)]
    pub users: BTreeMap<String, String>,
}

/// Durable store of registered accounts.
///
/// Passwords are compared as plain strings. A salted hash could replace the
/// stored value without changing `verify`'s signature or the wire protocol.
#[derive(Debug)]
pub struct CredentialStore {
    path: PathBuf,
    users: Mutex<BTreeMap<String, String>>,
    /// Held for the duration of a registration's disk write.
    writer: Mutex<()>,
}

impl CredentialStore {
    /// Loads the store from `path`.
    ///
    /// A missing file yields an empty store and an empty file is written
    /// immediately, so the backing file always exists after a successful load.
    /// A file that cannot be read or parsed is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ChatError> {
        let path = path.as_ref().to_path_buf();
        let users = match std::fs::read_to_string(&path) {
            Ok(contents) => {
                let file: CredentialsFile = serde_json::from_str(&contents).map_err(|e| {
                    ChatError::Persistence(format!(
                        "Failed to parse credentials file '{}': {e}",
                        path.display()
                    ))
                })?;
                info!(
                    "Loaded {} registered users from '{}'.",
                    file.users.len(),
                    path.display()
                );
                file.users
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "Credentials file '{}' not found. Creating an empty one.",
                    path.display()
                );
                let empty = BTreeMap::new();
                write_file(&path, &empty)?;
                empty
            }
            Err(e) => {
                return Err(ChatError::Persistence(format!(
                    "Failed to read credentials file '{}': {e}",
                    path.display()
                )));
            }
        };

        Ok(Self {
            path,
            users: Mutex::new(users),
            writer: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, username: &str) -> bool {
        self.users.lock().contains_key(username)
    }

    /// Exact comparison against the registered password. Unknown users never verify.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        self.users
            .lock()
            .get(username)
            .is_some_and(|stored| stored == password)
    }

    /// Registers a new account and persists the whole mapping before returning.
    ///
    /// Registrations are serialized by `writer`. The file is written from a
    /// snapshot and the map is only updated once the write succeeded, so
    /// lookups never wait on disk and a failed write leaves no trace.
    pub fn register(&self, username: &str, password: &str) -> Result<(), ChatError> {
        let _writer = self.writer.lock();

        let mut snapshot = {
            let users = self.users.lock();
            if users.contains_key(username) {
                return Err(ChatError::AlreadyRegistered(username.to_string()));
            }
            users.clone()
        };
        snapshot.insert(username.to_string(), password.to_string());
        write_file(&self.path, &snapshot)?;

        self.users
            .lock()
            .insert(username.to_string(), password.to_string());
        info!("Registered new user '{}'.", username);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.users.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.lock().is_empty()
    }
}

/// Writes the full mapping to a sibling temp file, then renames it over `path`.
fn write_file(path: &Path, users: &BTreeMap<String, String>) -> Result<(), ChatError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            ChatError::Persistence(format!(
                "Failed to create directory '{}': {e}",
                parent.display()
            ))
        })?;
    }

    let file = CredentialsFile {
        users: users.clone(),
    };
    let json = serde_json::to_string_pretty(&file)?;

    let temp_path = PathBuf::from(format!(
        "{}.tmp-{}",
        path.display(),
        rand::random::<u32>()
    ));
    std::fs::write(&temp_path, json).map_err(|e| {
        ChatError::Persistence(format!("Failed to write temp credentials file: {e}"))
    })?;
    std::fs::rename(&temp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&temp_path);
        ChatError::Persistence(format!(
            "Failed to atomically rename credentials file '{}': {e}",
            path.display()
        ))
    })?;
    Ok(())
}
