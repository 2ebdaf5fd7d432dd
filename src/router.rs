//! Line routing
//!
//! Turns a parsed `ClientLine` from an active session into deliveries
//! through the `Registry`, and builds the presence and roster fan-outs.
//! Runs inside the `ChatServer` actor, so every call sees a consistent
//! registry.

use tracing::{debug, warn};

use crate::error::{ProtocolError, SendError};
use crate::message::{ClientLine, ServerMessage};
use crate::registry::Registry;
use crate::session::Sink;
use crate::types::Username;

/// Dispatch one line from `sender`
pub fn route(registry: &Registry, sender: &Username, line: ClientLine) {
    let Ok(sender_sink) = registry.lookup(sender.as_str()) else {
        debug!("Dropping line from unregistered sender '{}'", sender);
        return;
    };

    match line {
        ClientLine::Public(text) => {
            let msg = ServerMessage::Chat {
                from: sender.to_string(),
                text,
            };
            broadcast(registry, Some(sender.as_str()), &msg);
        }
        ClientLine::Private { target, text } => {
            private_message(registry, sender, sender_sink, target, text);
        }
        ClientLine::MalformedPrivate => {
            deliver(sender_sink, sender.as_str(), ProtocolError::Usage.into());
        }
        ClientLine::Exit => {
            // Handled by the connection; never forwarded here.
        }
    }
}

/// Point-to-point delivery plus confirmation to the sender
fn private_message(
    registry: &Registry,
    sender: &Username,
    sender_sink: &Sink,
    target: String,
    text: String,
) {
    let target_sink = match registry.lookup(&target) {
        Ok(sink) => sink,
        Err(e) => {
            deliver(sender_sink, sender.as_str(), ProtocolError::from(e).into());
            return;
        }
    };

    deliver(
        target_sink,
        &target,
        ServerMessage::PrivateIncoming {
            from: sender.to_string(),
            text: text.clone(),
        },
    );
    deliver(
        sender_sink,
        sender.as_str(),
        ServerMessage::PrivateConfirm { to: target, text },
    );
}

/// Send `msg` to every registered session except `exclude`
///
/// Returns how many peers accepted the message.
pub fn broadcast(registry: &Registry, exclude: Option<&str>, msg: &ServerMessage) -> usize {
    let mut delivered = 0;
    registry.for_each_except(exclude, |name, sink| {
        if deliver(sink, name.as_str(), msg.clone()) {
            delivered += 1;
        }
    });
    delivered
}

/// Join announcement followed by a fresh roster, to everyone
pub fn announce_join(registry: &Registry, username: &Username) {
    let msg = ServerMessage::Joined {
        username: username.to_string(),
    };
    broadcast(registry, None, &msg);
    broadcast_roster(registry);
}

/// Leave announcement followed by a fresh roster, to everyone still registered
pub fn announce_leave(registry: &Registry, username: &Username) {
    let msg = ServerMessage::Left {
        username: username.to_string(),
    };
    broadcast(registry, None, &msg);
    broadcast_roster(registry);
}

/// Send the current roster snapshot to every registered session
pub fn broadcast_roster(registry: &Registry) {
    let msg = ServerMessage::Roster {
        names: registry.snapshot_names(),
    };
    broadcast(registry, None, &msg);
}

/// Best-effort single delivery; failures are logged and dropped
fn deliver(sink: &Sink, name: &str, msg: ServerMessage) -> bool {
    match sink.deliver(msg) {
        Ok(()) => true,
        Err(SendError::Full) => {
            warn!("Outbound queue full for '{}', dropping message", name);
            false
        }
        Err(SendError::ChannelClosed) => {
            debug!("Outbound channel closed for '{}'", name);
            false
        }
    }
}
