//! Protocol error types.

use thiserror::Error;

pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while talking to the ds-server.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("connection closed by server before a full line arrived")]
    Closed,

    #[error("malformed {command} line {line:?}: {reason}")]
    Malformed {
        command: String,
        line: String,
        reason: String,
    },

    #[error("unknown command token: {0:?}")]
    UnknownCommand(String),

    #[error("expected {expected}, got {got:?}")]
    UnexpectedReply { expected: &'static str, got: String },

    #[error("lock-step violation: {0}")]
    OutOfTurn(&'static str),
}

impl ProtocolError {
    /// Unknown command tokens are skipped; everything else ends the session.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ProtocolError::UnknownCommand(_))
    }

    pub(crate) fn malformed(command: &str, line: &str, reason: impl Into<String>) -> Self {
        ProtocolError::Malformed {
            command: command.to_string(),
            line: line.to_string(),
            reason: reason.into(),
        }
    }
}
