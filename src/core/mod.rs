// src/core/mod.rs

//! The central module containing the core logic and data structures of the relay.

pub mod auth;
pub mod credentials;
pub mod errors;
pub mod metrics;
pub mod protocol;
pub mod registry;
pub mod state;

pub use errors::ChatError;
pub use registry::{SessionHandle, SessionRegistry};
