//! Multi-user TCP Chat Relay - Entry Point
//!
//! Binds the listener and hands it to the accept loop.

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chat_relay::{serve, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=chat_relay=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("chat_relay=info")),
        )
        .init();

    // Bind address from command line, CHAT_RELAY_ADDR, or default
    let config = ServerConfig::from_env();

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("Chat relay listening on {}", config.bind_addr);

    serve(listener, config).await;

    Ok(())
}
