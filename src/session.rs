//! Session state and outbound sink
//!
//! A `Session` tracks one connection from accept to release. Its `Sink` is
//! the handle other parts of the server use to queue lines for that peer.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::{AppError, SendError};
use crate::message::ServerMessage;
use crate::types::{ClientId, Username};

/// Connection lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Accepted, prompt not yet sent
    Connecting,
    /// Prompt sent, waiting for the username line
    AwaitingUsername,
    /// Registered and relaying lines
    Active,
    /// Cleaning up
    Closing,
    /// Connection released
    Closed,
}

impl SessionState {
    fn can_advance_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Connecting, AwaitingUsername)
                | (AwaitingUsername, Active)
                | (Connecting | AwaitingUsername | Active, Closing)
                | (Closing, Closed)
        )
    }
}

/// Per-connection state
///
/// Holds no username until registration succeeds; from then on the name is
/// fixed for the life of the session.
#[derive(Debug)]
pub struct Session {
    id: ClientId,
    username: Option<Username>,
    state: SessionState,
}

impl Session {
    pub fn new(id: ClientId) -> Self {
        Self {
            id,
            username: None,
            state: SessionState::Connecting,
        }
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn username(&self) -> Option<&Username> {
        self.username.as_ref()
    }

    /// Liveness flag: true until cleanup starts
    pub fn is_live(&self) -> bool {
        !matches!(self.state, SessionState::Closing | SessionState::Closed)
    }

    /// Get the display name for this session
    ///
    /// Returns the username if registered, otherwise "Unknown".
    pub fn display_name(&self) -> &str {
        self.username.as_ref().map_or("Unknown", Username::as_str)
    }

    /// Prompt has been sent
    pub fn await_username(&mut self) -> Result<(), AppError> {
        self.advance(SessionState::AwaitingUsername)
    }

    /// Registration succeeded
    pub fn activate(&mut self, username: Username) -> Result<(), AppError> {
        self.advance(SessionState::Active)?;
        self.username = Some(username);
        Ok(())
    }

    /// Enter cleanup. Calling it again while already closing is a no-op.
    pub fn begin_closing(&mut self) -> Result<(), AppError> {
        if self.state == SessionState::Closing {
            return Ok(());
        }
        self.advance(SessionState::Closing)
    }

    pub fn close(&mut self) -> Result<(), AppError> {
        self.advance(SessionState::Closed)
    }

    fn advance(&mut self, next: SessionState) -> Result<(), AppError> {
        if !self.state.can_advance_to(next) {
            return Err(AppError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }
}

/// Outbound handle for one connection
///
/// Cloned into the registry on registration. Delivery never waits: a full
/// queue drops the message for this peer only.
#[derive(Debug, Clone)]
pub struct Sink {
    id: ClientId,
    sender: mpsc::Sender<ServerMessage>,
}

impl Sink {
    pub fn new(id: ClientId, sender: mpsc::Sender<ServerMessage>) -> Self {
        Self { id, sender }
    }

    /// Id of the session that owns this sink
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Queue a message for this peer without blocking
    pub fn deliver(&self, msg: ServerMessage) -> Result<(), SendError> {
        self.sender.try_send(msg).map_err(|e| match e {
            TrySendError::Full(_) => SendError::Full,
            TrySendError::Closed(_) => SendError::ChannelClosed,
        })
    }
}
