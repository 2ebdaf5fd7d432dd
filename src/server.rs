//! ChatServer Actor implementation
//!
//! The central actor that owns the `Registry`. Connection handlers never touch
//! the registry directly; they send `ServerCommand`s over an mpsc channel, and
//! the actor applies them one at a time. That ordering is what makes
//! registration, deregistration and every roster snapshot linearizable.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use crate::config::ServerConfig;
use crate::error::RegistryError;
use crate::handler::handle_connection;
use crate::message::ClientLine;
use crate::registry::Registry;
use crate::router;
use crate::session::Sink;
use crate::types::{ClientId, Username};

/// Commands sent from handlers to the ChatServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// Claim a username; on success the join and roster go out before the reply
    Register {
        username: Username,
        sink: Sink,
        reply: oneshot::Sender<Result<(), RegistryError>>,
    },
    /// Release a username held by `client_id`
    Deregister {
        client_id: ClientId,
        username: Username,
    },
    /// A line from an active session
    Route {
        username: Username,
        line: ClientLine,
    },
    /// Current roster
    #[cfg(test)]
    Snapshot {
        reply: oneshot::Sender<Vec<String>>,
    },
}

/// The main ChatServer actor
///
/// Owns the registry and processes commands from connection handlers.
pub struct ChatServer {
    /// Live usernames: Username -> Sink
    registry: Registry,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
}

impl ChatServer {
    /// Create a new ChatServer with the given command receiver
    pub fn new(receiver: mpsc::Receiver<ServerCommand>) -> Self {
        Self {
            registry: Registry::new(),
            receiver,
        }
    }

    /// Run the ChatServer event loop
    ///
    /// Continuously receives and processes commands until all senders are dropped.
    pub async fn run(mut self) {
        info!("ChatServer started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("ChatServer shutting down");
    }

    /// Process a single command
    fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Register {
                username,
                sink,
                reply,
            } => {
                let client_id = sink.id();
                let result = self.handle_register(username.clone(), sink);
                let registered = result.is_ok();
                // A handler that stopped waiting never becomes active and so
                // never deregisters; release the name here instead.
                if reply.send(result).is_err() && registered {
                    debug!("Client {} gone before registration reply", client_id);
                    self.handle_deregister(client_id, username);
                }
            }
            ServerCommand::Deregister {
                client_id,
                username,
            } => {
                self.handle_deregister(client_id, username);
            }
            ServerCommand::Route { username, line } => {
                router::route(&self.registry, &username, line);
            }
            #[cfg(test)]
            ServerCommand::Snapshot { reply } => {
                let _ = reply.send(self.registry.snapshot_names());
            }
        }
    }

    /// Handle username registration
    fn handle_register(&mut self, username: Username, sink: Sink) -> Result<(), RegistryError> {
        let client_id = sink.id();
        if let Err(e) = self.registry.register(username.clone(), sink) {
            debug!("Client {} registration refused: {}", client_id, e);
            return Err(e);
        }

        info!("Client {} registered as '{}'", client_id, username);
        router::announce_join(&self.registry, &username);

        debug!("Total registered: {}", self.registry.len());
        Ok(())
    }

    /// Handle username release
    ///
    /// Only removes the entry if it still belongs to `client_id`.
    fn handle_deregister(&mut self, client_id: ClientId, username: Username) {
        let owned = self
            .registry
            .lookup(username.as_str())
            .is_ok_and(|sink| sink.id() == client_id);
        if !owned {
            debug!(
                "Client {} does not hold '{}', nothing to deregister",
                client_id, username
            );
            return;
        }

        self.registry.deregister(username.as_str());
        info!("Client {} ('{}') deregistered", client_id, username);
        router::announce_leave(&self.registry, &username);

        debug!("Total registered: {}", self.registry.len());
    }
}

/// Accept connections forever
///
/// Spawns the `ChatServer` actor, then one `handle_connection` task per
/// accepted socket. Accept errors are logged and the loop keeps going.
pub async fn serve(listener: TcpListener, config: ServerConfig) {
    let config = Arc::new(config);

    let (cmd_tx, cmd_rx) = mpsc::channel(config.command_buffer);
    tokio::spawn(ChatServer::new(cmd_rx).run());
    info!("ChatServer actor started");

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                info!("New connection from {}", addr);
                let cmd_tx = cmd_tx.clone();
                let config = Arc::clone(&config);

                // Spawn handler task for each connection
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, cmd_tx, config).await {
                        error!("Connection handler error: {}", e);
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ServerMessage;

    struct Harness {
        cmd_tx: mpsc::Sender<ServerCommand>,
    }

    impl Harness {
        fn spawn() -> Self {
            let (cmd_tx, cmd_rx) = mpsc::channel(16);
            tokio::spawn(ChatServer::new(cmd_rx).run());
            Self { cmd_tx }
        }

        async fn register(
            &self,
            raw: &str,
        ) -> (ClientId, Result<(), RegistryError>, mpsc::Receiver<ServerMessage>) {
            let (tx, rx) = mpsc::channel(16);
            let client_id = ClientId::new();
            let (reply_tx, reply_rx) = oneshot::channel();
            self.cmd_tx
                .send(ServerCommand::Register {
                    username: Username::parse(raw).unwrap(),
                    sink: Sink::new(client_id, tx),
                    reply: reply_tx,
                })
                .await
                .unwrap();
            (client_id, reply_rx.await.unwrap(), rx)
        }

        async fn snapshot(&self) -> Vec<String> {
            let (reply_tx, reply_rx) = oneshot::channel();
            self.cmd_tx
                .send(ServerCommand::Snapshot { reply: reply_tx })
                .await
                .unwrap();
            reply_rx.await.unwrap()
        }

        async fn deregister(&self, client_id: ClientId, raw: &str) {
            self.cmd_tx
                .send(ServerCommand::Deregister {
                    client_id,
                    username: Username::parse(raw).unwrap(),
                })
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_register_announces_join() {
        let server = Harness::spawn();

        let (_, result, mut rx) = server.register("alice").await;
        assert!(result.is_ok());

        assert_eq!(
            rx.recv().await.unwrap().to_string(),
            "🔵 alice has joined the chat!"
        );
        assert_eq!(rx.recv().await.unwrap().to_string(), "/users alice");
    }

    #[tokio::test]
    async fn test_duplicate_register_rejected() {
        let server = Harness::spawn();

        let (_, first, _rx1) = server.register("alice").await;
        let (_, second, mut rx2) = server.register("alice").await;

        assert!(first.is_ok());
        assert_eq!(second, Err(RegistryError::AlreadyTaken("alice".to_string())));
        assert!(rx2.try_recv().is_err());
        assert_eq!(server.snapshot().await, vec!["alice"]);
    }

    #[tokio::test]
    async fn test_deregister_by_non_owner_ignored() {
        let server = Harness::spawn();

        let (_, result, _rx) = server.register("alice").await;
        assert!(result.is_ok());

        server.deregister(ClientId::new(), "alice").await;
        assert_eq!(server.snapshot().await, vec!["alice"]);
    }

    #[tokio::test]
    async fn test_deregister_announces_leave() {
        let server = Harness::spawn();

        let (alice_id, _, _alice_rx) = server.register("alice").await;
        let (_, _, mut bob_rx) = server.register("bob").await;

        server.deregister(alice_id, "alice").await;
        server.deregister(alice_id, "alice").await;
        assert_eq!(server.snapshot().await, vec!["bob"]);

        let mut lines = Vec::new();
        while let Ok(msg) = bob_rx.try_recv() {
            lines.push(msg.to_string());
        }
        assert_eq!(
            lines,
            vec![
                "🔵 bob has joined the chat!",
                "/users alice,bob",
                "🔴 alice has left the chat.",
                "/users bob",
            ]
        );
    }

    #[tokio::test]
    async fn test_register_without_waiting_handler_is_released() {
        let server = Harness::spawn();
        let (_, _, mut alice_rx) = server.register("alice").await;

        let (tx, _ghost_rx) = mpsc::channel(16);
        let (reply_tx, reply_rx) = oneshot::channel();
        drop(reply_rx);
        server
            .cmd_tx
            .send(ServerCommand::Register {
                username: Username::parse("ghost").unwrap(),
                sink: Sink::new(ClientId::new(), tx),
                reply: reply_tx,
            })
            .await
            .unwrap();

        assert_eq!(server.snapshot().await, vec!["alice"]);

        let mut lines = Vec::new();
        while let Ok(msg) = alice_rx.try_recv() {
            lines.push(msg.to_string());
        }
        assert_eq!(
            lines,
            vec![
                "🔵 alice has joined the chat!",
                "/users alice",
                "🔵 ghost has joined the chat!",
                "/users alice,ghost",
                "🔴 ghost has left the chat.",
                "/users alice",
            ]
        );
    }

    #[tokio::test]
    async fn test_concurrent_registration_single_winner() {
        let server = Harness::spawn();

        let attempts = (0..8).map(|_| server.register("alice"));
        let results = futures_util::future::join_all(attempts).await;

        let winners = results.iter().filter(|(_, r, _)| r.is_ok()).count();
        assert_eq!(winners, 1);
        assert_eq!(server.snapshot().await, vec!["alice"]);
    }
}
