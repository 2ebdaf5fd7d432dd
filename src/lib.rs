//! Multi-user TCP Chat Relay Library
//!
//! A line-oriented chat server built on tokio. Clients connect, pick a
//! unique username, and exchange public and private messages.
//!
//! # Features
//! - Username handshake with uniqueness check
//! - Public broadcast to everyone but the sender
//! - Private messages with `/msg <username> <text>`
//! - Join/leave announcements and `/users` roster updates
//! - Graceful `exit` and abrupt-disconnect cleanup
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `ChatServer` is the central actor owning the `Registry`
//! - Each connection has a `handler` task communicating with the server
//! - Each connection has a writer task draining its outbound queue
//! - No locks needed - all registry access goes through message passing
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use chat_relay::{serve, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig::default();
//!     let listener = TcpListener::bind(&config.bind_addr).await.unwrap();
//!     serve(listener, config).await;
//! }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod handler;
pub mod message;
pub mod registry;
pub mod router;
pub mod server;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use codec::ChatLineCodec;
pub use config::ServerConfig;
pub use error::{AppError, CodecError, ProtocolError, RegistryError, SendError};
pub use handler::handle_connection;
pub use message::{ClientLine, ServerMessage};
pub use registry::Registry;
pub use server::{serve, ChatServer, ServerCommand};
pub use session::{Session, SessionState, Sink};
pub use types::{ClientId, Username};
