// src/core/protocol/private_message.rs

//! Parser for the `> name1, name2 : body` private-message syntax.

use thiserror::Error;

/// A parsed private message: who it is for and what it says.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateMessage {
    /// Trimmed recipient names, in the order written. May contain empty names
    /// (e.g. `> , bob : hi`), which never resolve to a session.
    pub recipients: Vec<String>,
    /// The trimmed text after the first `:`.
    pub body: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrivateMessageError {
    #[error("private message does not start with '>'")]
    MissingMarker,
    #[error("private message has no ':' separating recipients from the body")]
    MissingSeparator,
    #[error("private message has no recipients before ':'")]
    EmptyRecipients,
}

impl PrivateMessage {
    /// Parses a full inbound line.
    ///
    /// The first `:` splits the recipient list from the body. A colon that
    /// immediately follows the `>` marker is rejected, as is a line with no
    /// colon at all.
    pub fn parse(line: &str) -> Result<Self, PrivateMessageError> {
        let rest = line
            .strip_prefix('>')
            .ok_or(PrivateMessageError::MissingMarker)?;
        let colon = rest.find(':').ok_or(PrivateMessageError::MissingSeparator)?;
        if colon == 0 {
            return Err(PrivateMessageError::EmptyRecipients);
        }

        let recipients = rest[..colon]
            .trim()
            .split(',')
            .map(|name| name.trim().to_string())
            .collect();
        let body = rest[colon + 1..].trim().to_string();

        Ok(Self { recipients, body })
    }
}
