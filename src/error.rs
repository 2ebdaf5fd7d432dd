//! Error types for the chat relay
//!
//! Defines connection-level errors, client-visible protocol errors,
//! registry errors and message send errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

use crate::session::SessionState;

/// Connection-level errors
///
/// Any of these ends the session that produced it. None of them reach
/// other sessions or the accept loop.
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error (fatal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Line framing error: oversized line or socket failure (fatal)
    #[error("Line codec error: {0}")]
    Codec(#[from] CodecError),

    /// Channel send error (fatal - server actor is gone)
    #[error("Channel send error")]
    ChannelSend,

    /// Session state machine was driven out of order
    #[error("Invalid session transition from {from:?} to {to:?}")]
    InvalidTransition { from: SessionState, to: SessionState },

    /// Client-visible protocol error
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Line framing errors
#[derive(Debug, Error)]
pub enum CodecError {
    /// Socket read or write failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Inbound line exceeded the configured limit
    #[error("Line too long: {actual} bytes (limit {limit})")]
    LineTooLong { actual: usize, limit: usize },
}

/// Errors reported to the offending client as a fixed chat line
///
/// `EmptyUsername` and `NameTaken` close the connection afterwards;
/// `Usage` and `UserNotFound` leave the session running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Username line was empty or whitespace only
    #[error("Empty username")]
    EmptyUsername,

    /// Another live session holds the requested name
    #[error("Username already taken: {0}")]
    NameTaken(String),

    /// `/msg` without both a target and a message
    #[error("Malformed private message")]
    Usage,

    /// Private message target is not registered
    #[error("User not found: {0}")]
    UserNotFound(String),
}

/// Registry operation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Name is already a key in the registry
    #[error("Name already taken: {0}")]
    AlreadyTaken(String),

    /// Name is not a key in the registry
    #[error("Name not found: {0}")]
    NotFound(String),
}

impl From<RegistryError> for ProtocolError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::AlreadyTaken(name) => ProtocolError::NameTaken(name),
            RegistryError::NotFound(name) => ProtocolError::UserNotFound(name),
        }
    }
}

/// Message send errors
///
/// Occurs when a session's outbound channel cannot take a message.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,

    /// The peer is not draining its queue fast enough
    #[error("Channel full")]
    Full,
}
