// src/core/protocol/codec.rs

//! A newline codec that reports over-long lines as frames instead of errors.
//!
//! `LinesCodec` signals an over-long line with an error, and a `Framed` stream
//! treats any decoder error as the end of the stream. Chat sessions must
//! survive a single bad line, so the error is turned into `InboundFrame::TooLong`
//! while `LinesCodec` discards the rest of that line internally.

use crate::core::errors::ChatError;
use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder, LinesCodec, LinesCodecError};

/// One decoded unit of inbound text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// A complete line, without its terminator (a trailing `\r` is stripped).
    Line(String),
    /// A line exceeded the maximum length and was discarded.
    TooLong,
}

#[derive(Debug, Clone)]
pub struct ChatLineCodec {
    inner: LinesCodec,
}

impl ChatLineCodec {
    pub fn new(max_line_length: usize) -> Self {
        Self {
            inner: LinesCodec::new_with_max_length(max_line_length),
        }
    }
}

fn into_frame(result: Result<Option<String>, LinesCodecError>) -> Result<Option<InboundFrame>, ChatError> {
    match result {
        Ok(line) => Ok(line.map(InboundFrame::Line)),
        Err(LinesCodecError::MaxLineLengthExceeded) => Ok(Some(InboundFrame::TooLong)),
        Err(LinesCodecError::Io(e)) => Err(e.into()),
    }
}

impl Decoder for ChatLineCodec {
    type Item = InboundFrame;
    type Error = ChatError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<InboundFrame>, ChatError> {
        into_frame(self.inner.decode(src))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<InboundFrame>, ChatError> {
        into_frame(self.inner.decode_eof(src))
    }
}

impl<T: AsRef<str>> Encoder<T> for ChatLineCodec {
    type Error = ChatError;

    fn encode(&mut self, line: T, dst: &mut BytesMut) -> Result<(), ChatError> {
        // `LinesCodec` only limits decoded lines; encoding can fail on I/O alone.
        self.inner.encode(line, dst).map_err(|e| match e {
            LinesCodecError::Io(e) => e.into(),
            LinesCodecError::MaxLineLengthExceeded => {
                ChatError::Internal("outbound line rejected by the line codec".into())
            }
        })
    }
}
