// src/core/protocol/messages.rs

//! Sentinel lines, notice formatting and inbound line classification.

use super::codec::ChatLineCodec;
use super::private_message::{PrivateMessage, PrivateMessageError};
use chrono::Local;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;

/// Sent when a handshake succeeds.
pub const WELCOME: &str = "Welcome";
/// Sent when the requested username is held by an active session.
pub const NAME_TAKEN: &str = "NameTaken";
/// Sent after a wrong password for a registered username.
pub const INCORRECT_PASSWORD: &str = "IncorrectPassword";
/// Sent when a new username must choose a password.
pub const PASSWORD_PROMPT: &str = "Enter your password:";
/// The listing line sent when nobody else is online.
pub const NO_ONE_ONLINE: &str = "There is no one in the chat :C";
pub const INVALID_PRIVATE_FORMAT: &str =
    "Invalid private message format. Use \"> Name, Name : message\".";
pub const LINE_TOO_LONG: &str = "Message too long.";

/// A socket framed as UTF-8 lines.
pub type LineFramed<S> = Framed<S, ChatLineCodec>;

/// Wraps a stream in a line codec that rejects lines longer than `max_line_length`.
pub fn framed_lines<S>(stream: S, max_line_length: usize) -> LineFramed<S>
where
    S: AsyncRead + AsyncWrite,
{
    Framed::new(stream, ChatLineCodec::new(max_line_length))
}

/// The wall-clock prefix used in chat and private lines, e.g. `02:03:59`.
/// Hours are on a 12-hour clock with no AM/PM marker.
pub fn timestamp() -> String {
    Local::now().format("%I:%M:%S").to_string()
}

/// `Users in chat: a, b`, or the placeholder when the list is empty.
pub fn online_listing(others: &[String]) -> String {
    if others.is_empty() {
        NO_ONE_ONLINE.to_string()
    } else {
        format!("Users in chat: {}", others.join(", "))
    }
}

pub fn joined_notice(username: &str) -> String {
    format!("{username} joined the chat!")
}

pub fn left_notice(username: &str) -> String {
    format!("{username} left the chat :с")
}

pub fn chat_line(time: &str, sender: &str, body: &str) -> String {
    format!("[{time}] {sender}: {body}")
}

pub fn private_delivery(time: &str, sender: &str, body: &str) -> String {
    format!("[{time}] Private message from {sender}: {body}")
}

pub fn private_confirmation(time: &str, recipients: &[String], body: &str) -> String {
    format!(
        "[{time}] Private message to {}: {body}",
        recipients.join(", ")
    )
}

pub fn user_not_found(name: &str) -> String {
    format!("User \"{name}\" not found.")
}

/// How the message loop should treat one inbound line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundLine<'a> {
    /// Empty or whitespace-only; ignored.
    Blank,
    /// A `>`-prefixed line, parsed or rejected.
    Private(Result<PrivateMessage, PrivateMessageError>),
    /// Anything else is broadcast verbatim.
    Chat(&'a str),
}

impl<'a> InboundLine<'a> {
    pub fn classify(line: &'a str) -> Self {
        if line.trim().is_empty() {
            InboundLine::Blank
        } else if line.starts_with('>') {
            InboundLine::Private(PrivateMessage::parse(line))
        } else {
            InboundLine::Chat(line)
        }
    }
}
