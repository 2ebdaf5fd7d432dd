//! Message protocol definitions
//!
//! Line-based bidirectional protocol. Inbound lines are classified once into
//! `ClientLine`; outbound traffic is built as `ServerMessage` values and only
//! turned into text by its `Display` impl when the writer frames it.

use std::fmt;

use crate::error::ProtocolError;

/// Command token introducing a private message
pub const PRIVATE_COMMAND: &str = "/msg";

/// Line that ends the session gracefully (matched case-insensitively)
pub const EXIT_COMMAND: &str = "exit";

/// Prefix of a roster snapshot line
pub const ROSTER_PREFIX: &str = "/users";

pub const JOIN_MARKER: &str = "🔵";
pub const LEAVE_MARKER: &str = "🔴";
pub const PRIVATE_MARKER: &str = "📩";
pub const CONFIRM_MARKER: &str = "✅";
pub const WARNING_MARKER: &str = "⚠";

/// Client → Server line, after the username handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientLine {
    /// Graceful disconnect
    Exit,
    /// `/msg <target> <text>`
    Private { target: String, text: String },
    /// `/msg ` prefix without both a target and a text part
    MalformedPrivate,
    /// Anything else, relayed verbatim
    Public(String),
}

impl ClientLine {
    /// Classify a raw inbound line
    ///
    /// A private command is split on single spaces into at most three parts,
    /// so the text keeps any further spaces. Empty parts are kept as-is:
    /// `/msg  bob hi` addresses the empty name.
    pub fn parse(line: &str) -> Self {
        if line.eq_ignore_ascii_case(EXIT_COMMAND) {
            return ClientLine::Exit;
        }

        let Some(rest) = line
            .strip_prefix(PRIVATE_COMMAND)
            .and_then(|rest| rest.strip_prefix(' '))
        else {
            return ClientLine::Public(line.to_string());
        };

        match rest.split_once(' ') {
            Some((target, text)) => ClientLine::Private {
                target: target.to_string(),
                text: text.to_string(),
            },
            None => ClientLine::MalformedPrivate,
        }
    }
}

/// Server → Client line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Sent once, right after accept
    Prompt,
    /// Blank username rejection
    InvalidUsername,
    /// Duplicate username rejection
    UsernameTaken,
    /// Someone registered
    Joined { username: String },
    /// Someone left
    Left { username: String },
    /// Current registered names, in registration order
    Roster { names: Vec<String> },
    /// Public message
    Chat { from: String, text: String },
    /// Private message, recipient side
    PrivateIncoming { from: String, text: String },
    /// Private message, sender side
    PrivateConfirm { to: String, text: String },
    /// Malformed `/msg`
    Usage,
    /// `/msg` target not registered
    UserNotFound { username: String },
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::Prompt => f.write_str("Enter your username:"),
            ServerMessage::InvalidUsername => {
                f.write_str("Invalid username. Connection closed.")
            }
            ServerMessage::UsernameTaken => {
                f.write_str("Username already taken. Connection closed.")
            }
            ServerMessage::Joined { username } => {
                write!(f, "{} {} has joined the chat!", JOIN_MARKER, username)
            }
            ServerMessage::Left { username } => {
                write!(f, "{} {} has left the chat.", LEAVE_MARKER, username)
            }
            ServerMessage::Roster { names } => {
                write!(f, "{} {}", ROSTER_PREFIX, names.join(","))
            }
            ServerMessage::Chat { from, text } => write!(f, "{}: {}", from, text),
            ServerMessage::PrivateIncoming { from, text } => {
                write!(f, "{} [Private] {}: {}", PRIVATE_MARKER, from, text)
            }
            ServerMessage::PrivateConfirm { to, text } => {
                write!(f, "{} [Private to {}] {}", CONFIRM_MARKER, to, text)
            }
            ServerMessage::Usage => write!(
                f,
                "{} Usage: {} <username> <message>",
                WARNING_MARKER, PRIVATE_COMMAND
            ),
            ServerMessage::UserNotFound { username } => {
                write!(f, "{} User {} not found.", WARNING_MARKER, username)
            }
        }
    }
}

/// Convert ProtocolError to ServerMessage for client notification
impl From<ProtocolError> for ServerMessage {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::EmptyUsername => ServerMessage::InvalidUsername,
            ProtocolError::NameTaken(_) => ServerMessage::UsernameTaken,
            ProtocolError::Usage => ServerMessage::Usage,
            ProtocolError::UserNotFound(username) => ServerMessage::UserNotFound { username },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exit_case_insensitive() {
        assert_eq!(ClientLine::parse("exit"), ClientLine::Exit);
        assert_eq!(ClientLine::parse("EXIT"), ClientLine::Exit);
        assert_eq!(ClientLine::parse("eXiT"), ClientLine::Exit);
        assert_eq!(
            ClientLine::parse(" exit"),
            ClientLine::Public(" exit".to_string())
        );
    }

    #[test]
    fn test_parse_private() {
        let line = ClientLine::parse("/msg bob see you at 10: ok?");
        assert_eq!(
            line,
            ClientLine::Private {
                target: "bob".to_string(),
                text: "see you at 10: ok?".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_private_missing_text() {
        assert_eq!(ClientLine::parse("/msg bob"), ClientLine::MalformedPrivate);
        assert_eq!(ClientLine::parse("/msg "), ClientLine::MalformedPrivate);
    }

    #[test]
    fn test_parse_private_empty_parts_kept() {
        assert_eq!(
            ClientLine::parse("/msg  bob hi"),
            ClientLine::Private {
                target: String::new(),
                text: "bob hi".to_string(),
            }
        );
        assert_eq!(
            ClientLine::parse("/msg bob "),
            ClientLine::Private {
                target: "bob".to_string(),
                text: String::new(),
            }
        );
    }

    #[test]
    fn test_parse_public_fallthrough() {
        assert_eq!(ClientLine::parse("/msg"), ClientLine::Public("/msg".to_string()));
        assert_eq!(
            ClientLine::parse("/msgbob hi"),
            ClientLine::Public("/msgbob hi".to_string())
        );
        assert_eq!(
            ClientLine::parse("/users"),
            ClientLine::Public("/users".to_string())
        );
        assert_eq!(ClientLine::parse(""), ClientLine::Public(String::new()));
    }

    #[test]
    fn test_wire_format() {
        let joined = ServerMessage::Joined {
            username: "alice".to_string(),
        };
        assert_eq!(joined.to_string(), "🔵 alice has joined the chat!");

        let left = ServerMessage::Left {
            username: "alice".to_string(),
        };
        assert_eq!(left.to_string(), "🔴 alice has left the chat.");

        let incoming = ServerMessage::PrivateIncoming {
            from: "alice".to_string(),
            text: "secret".to_string(),
        };
        assert_eq!(incoming.to_string(), "📩 [Private] alice: secret");

        let confirm = ServerMessage::PrivateConfirm {
            to: "bob".to_string(),
            text: "secret".to_string(),
        };
        assert_eq!(confirm.to_string(), "✅ [Private to bob] secret");

        assert_eq!(
            ServerMessage::Usage.to_string(),
            "⚠ Usage: /msg <username> <message>"
        );
    }

    #[test]
    fn test_roster_format() {
        let roster = ServerMessage::Roster {
            names: vec!["alice".to_string(), "bob".to_string(), "carol".to_string()],
        };
        assert_eq!(roster.to_string(), "/users alice,bob,carol");

        let empty = ServerMessage::Roster { names: Vec::new() };
        assert_eq!(empty.to_string(), "/users ");
    }

    #[test]
    fn test_protocol_error_conversion() {
        let msg: ServerMessage = ProtocolError::UserNotFound("zed".to_string()).into();
        assert_eq!(msg.to_string(), "⚠ User zed not found.");

        let msg: ServerMessage = ProtocolError::NameTaken("alice".to_string()).into();
        assert_eq!(msg.to_string(), "Username already taken. Connection closed.");

        let msg: ServerMessage = ProtocolError::EmptyUsername.into();
        assert_eq!(msg.to_string(), "Invalid username. Connection closed.");
    }
}
