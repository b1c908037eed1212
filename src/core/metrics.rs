// src/core/metrics.rs

//! Defines and registers Prometheus metrics for server monitoring.
//!
//! This module uses `lazy_static` to ensure that metrics are registered only once
//! globally for the entire application lifecycle.

use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, TextEncoder, register_counter, register_gauge};

lazy_static! {
    // --- Server-wide Gauges ---
    /// The number of TCP connections currently open, authenticated or not.
    pub static ref CONNECTED_CLIENTS: Gauge =
        register_gauge!("chatrelay_connected_clients", "Number of currently connected clients.").unwrap();
    /// The number of sessions that completed the handshake and are in the registry.
    pub static ref ACTIVE_SESSIONS: Gauge =
        register_gauge!("chatrelay_active_sessions", "Number of authenticated chat sessions.").unwrap();


    // --- Server-wide Counters ---
    /// The total number of connections accepted by the server since startup.
    pub static ref CONNECTIONS_RECEIVED_TOTAL: Counter =
        register_counter!("chatrelay_connections_received_total", "Total number of connections received.").unwrap();
    /// The total number of chat lines fanned out to the room.
    pub static ref MESSAGES_BROADCAST_TOTAL: Counter =
        register_counter!("chatrelay_messages_broadcast_total", "Total number of chat lines broadcast.").unwrap();
    /// The total number of private messages delivered (one per send, not per recipient).
    pub static ref PRIVATE_MESSAGES_TOTAL: Counter =
        register_counter!("chatrelay_private_messages_total", "Total number of private messages delivered.").unwrap();
    /// The total number of rejected password attempts.
    pub static ref AUTH_FAILURES_TOTAL: Counter =
        register_counter!("chatrelay_auth_failures_total", "Total number of failed password attempts.").unwrap();
    /// The total number of accounts created.
    pub static ref REGISTRATIONS_TOTAL: Counter =
        register_counter!("chatrelay_registrations_total", "Total number of new user registrations.").unwrap();
}

/// Gathers all registered metrics and encodes them in the Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder.encode_to_string(&metric_families).unwrap_or_default()
}
