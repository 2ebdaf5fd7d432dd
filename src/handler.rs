//! TCP connection handler
//!
//! Drives one client through its session lifecycle: prompt, username
//! handshake, line relay, and cleanup. Inbound lines are read here; outbound
//! lines go through a per-session channel drained by a writer task.

use std::sync::Arc;

use futures_util::stream::SplitStream;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

use crate::codec::ChatLineCodec;
use crate::config::ServerConfig;
use crate::error::{AppError, ProtocolError};
use crate::message::{ClientLine, ServerMessage};
use crate::server::ServerCommand;
use crate::session::{Session, Sink};
use crate::types::{ClientId, Username};

type LineStream = SplitStream<Framed<TcpStream, ChatLineCodec>>;

/// Handle a new TCP connection
///
/// Returns once the session is closed. Cleanup runs on every path: a
/// registered name is released and its leave announced, queued lines get
/// `close_grace` to flush, and the socket is dropped.
pub async fn handle_connection(
    stream: TcpStream,
    cmd_tx: mpsc::Sender<ServerCommand>,
    config: Arc<ServerConfig>,
) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let client_id = ClientId::new();
    let mut session = Session::new(client_id);
    info!("Client {} connected from {}", client_id, peer_addr);

    let framed = Framed::new(stream, ChatLineCodec::new(config.max_line_length));
    let (mut line_sink, mut lines) = framed.split();

    // Create channel for server -> client messages
    let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(config.outbound_buffer);

    // Spawn write task (ServerMessage -> line)
    let mut write_task = tokio::spawn(async move {
        while let Some(msg) = msg_rx.recv().await {
            if let Err(e) = line_sink.send(msg.to_string()).await {
                debug!("Line send failed, ending write task: {}", e);
                break;
            }
        }
        let _ = line_sink.close().await;
    });

    let sink = Sink::new(client_id, msg_tx);

    let result = match run_session(&mut session, &sink, &mut lines, &cmd_tx).await {
        Err(AppError::Protocol(rejection)) => {
            info!("Client {} rejected: {}", client_id, rejection);
            let _ = sink.deliver(rejection.into());
            Ok(())
        }
        other => other,
    };

    // CLOSING
    if let Err(e) = session.begin_closing() {
        warn!("Client {}: {}", client_id, e);
    }
    if let Some(username) = session.username() {
        let cmd = ServerCommand::Deregister {
            client_id,
            username: username.clone(),
        };
        if cmd_tx.send(cmd).await.is_err() {
            warn!("Failed to deregister client {} - server closed", client_id);
        }
    }
    drop(sink);

    // CLOSED
    if timeout(config.close_grace, &mut write_task).await.is_err() {
        debug!("Writer for {} did not drain in time, aborting", client_id);
        write_task.abort();
    }
    drop(lines);
    if let Err(e) = session.close() {
        warn!("Client {}: {}", client_id, e);
    }

    info!("Client {} ({}) disconnected", client_id, session.display_name());

    result
}

/// Handshake and relay loop
///
/// Returns `Ok` on peer close or `exit`. A `Protocol` error means the client
/// was rejected during the handshake; end of stream before a username counts
/// as an empty one.
async fn run_session(
    session: &mut Session,
    sink: &Sink,
    lines: &mut LineStream,
    cmd_tx: &mpsc::Sender<ServerCommand>,
) -> Result<(), AppError> {
    // CONNECTING
    sink.deliver(ServerMessage::Prompt)
        .map_err(|_| AppError::ChannelSend)?;
    session.await_username()?;

    // AWAITING_USERNAME
    let Some(raw) = lines.next().await.transpose()? else {
        debug!("Client {} closed before sending a username", session.id());
        return Err(ProtocolError::EmptyUsername.into());
    };
    let username = Username::parse(&raw)?;

    let (reply_tx, reply_rx) = oneshot::channel();
    cmd_tx
        .send(ServerCommand::Register {
            username: username.clone(),
            sink: sink.clone(),
            reply: reply_tx,
        })
        .await
        .map_err(|_| AppError::ChannelSend)?;
    reply_rx
        .await
        .map_err(|_| AppError::ChannelSend)?
        .map_err(ProtocolError::from)?;
    session.activate(username.clone())?;

    // ACTIVE
    while let Some(line) = lines.next().await {
        let line = line?;
        match ClientLine::parse(&line) {
            ClientLine::Exit => {
                debug!("Client {} sent exit", session.id());
                break;
            }
            line => {
                cmd_tx
                    .send(ServerCommand::Route {
                        username: username.clone(),
                        line,
                    })
                    .await
                    .map_err(|_| AppError::ChannelSend)?;
            }
        }
    }

    Ok(())
}
