// src/connection/mod.rs

//! Manages the lifecycle of a single client TCP connection: the handshake,
//! the chat message loop, and cleanup on every exit path.

// Declare the private sub-modules of the `connection` module.
mod guard;
mod handler;

// Publicly re-export the primary types from the sub-modules.
pub use guard::ConnectionGuard;
pub use handler::ConnectionHandler;
