// src/core/protocol/mod.rs

//! The newline-delimited text protocol spoken between clients and the relay.

pub mod codec;
pub mod messages;
pub mod private_message;

pub use codec::{ChatLineCodec, InboundFrame};
pub use messages::{InboundLine, LineFramed, framed_lines};
pub use private_message::{PrivateMessage, PrivateMessageError};
