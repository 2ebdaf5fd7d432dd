//! Basic type definitions for the chat relay
//!
//! Provides newtype wrappers for type safety:
//! - `ClientId`: UUID-based unique connection identifier
//! - `Username`: validated, case-sensitive chat name

use std::borrow::Borrow;

use uuid::Uuid;

use crate::error::ProtocolError;

/// Unique connection identifier (newtype pattern)
///
/// Wraps a UUID v4. Every accepted connection gets one, so a session can be
/// told apart before it has a username and after it has released one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(pub Uuid);

impl ClientId {
    /// Create a new random client ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Registered chat name
///
/// Never blank. Stored exactly as sent, so comparison is case- and
/// whitespace-sensitive: `Alice`, `alice` and `alice ` are distinct users.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Username(String);

impl Username {
    /// Validate the raw first line sent by a client
    ///
    /// A line that is empty or whitespace only is rejected with
    /// `EmptyUsername`; anything else is kept verbatim.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        if raw.trim().is_empty() {
            return Err(ProtocolError::EmptyUsername);
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Lets HashMap<Username, _> be queried with a plain &str.
impl Borrow<str> for Username {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
