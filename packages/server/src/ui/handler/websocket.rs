//! WebSocket connection lifecycle.
//!
//! rate check -> upgrade -> register -> writer task + reader loop -> deregister
//! -> stop writer -> close transport.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json,
    extract::{
        ConnectInfo, State,
        ws::{Message, WebSocket, WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};

use crate::{
    domain::{PeerId, entity::OUTBOUND_QUEUE_CAPACITY},
    infrastructure::dto::websocket::Envelope,
    ui::state::AppState,
};

pub async fn websocket_handler(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    State(state): State<Arc<AppState>>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
) -> Response {
    let address = client_address(&remote.to_string());

    // refuse before upgrading
    if let Err(e) = state.connect_peer_usecase.admit(&address) {
        tracing::warn!("Rejecting connection: {}", e);
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({"error": "too many connections"})),
        )
            .into_response();
    }

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            tracing::warn!("WebSocket upgrade error from {}: {}", address, rejection);
            return rejection.into_response();
        }
    };

    ws.on_failed_upgrade(|e| tracing::warn!("WebSocket upgrade failed: {}", e))
        .on_upgrade(move |socket| handle_socket(socket, state, address))
}

/// Source address used for rate limiting: the host part of `remote`, or
/// `remote` itself when it does not parse as `host:port`.
pub fn client_address(remote: &str) -> String {
    remote
        .parse::<SocketAddr>()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|_| remote.to_string())
}

/// Result of reading one frame
enum Inbound {
    Envelope(Envelope),
    Ignore,
    Closed,
}

fn read_frame(peer_id: &PeerId, frame: Option<Result<Message, axum::Error>>) -> Inbound {
    let parsed = match frame {
        Some(Ok(Message::Text(text))) => Envelope::from_json(text.as_str()),
        Some(Ok(Message::Binary(bytes))) => Envelope::from_slice(&bytes),
        Some(Ok(Message::Ping(_) | Message::Pong(_))) => return Inbound::Ignore,
        Some(Ok(Message::Close(_))) => {
            tracing::info!("Peer '{}' requested close", peer_id);
            return Inbound::Closed;
        }
        Some(Err(e)) => {
            tracing::warn!("Read error from peer '{}': {}", peer_id, e);
            return Inbound::Closed;
        }
        None => return Inbound::Closed,
    };

    match parsed {
        Ok(envelope) => Inbound::Envelope(envelope),
        Err(e) => {
            tracing::warn!("Unparseable frame from peer '{}': {}", peer_id, e);
            Inbound::Closed
        }
    }
}

/// Spawns the writer: drains the outbound queue into the WebSocket until the
/// done signal fires or a write fails, then closes the transport.
///
/// # Arguments
///
/// * `rx` - The peer's outbound queue
/// * `sender` - WebSocket sink, owned exclusively by this task
/// * `done` - Fired by the reader side on teardown
fn pusher_loop(
    peer_id: PeerId,
    mut rx: mpsc::Receiver<String>,
    mut sender: SplitSink<WebSocket, Message>,
    mut done: oneshot::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = &mut done => break,
                message = rx.recv() => {
                    let Some(message) = message else {
                        break;
                    };
                    if let Err(e) = sender.send(Message::Text(message.into())).await {
                        tracing::warn!("Write error to peer '{}': {}", peer_id, e);
                        break;
                    }
                }
            }
        }

        if let Err(e) = sender.close().await {
            tracing::debug!("Failed to close connection of peer '{}': {}", peer_id, e);
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, address: String) {
    let (sender, mut receiver) = socket.split();
    let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
    let (done_tx, done_rx) = oneshot::channel();

    let peer = state.connect_peer_usecase.execute(tx).await;
    tracing::info!("Peer '{}' connected from {}", peer.id, address);

    let mut writer = pusher_loop(peer.id, rx, sender, done_rx);
    let mut writer_finished = false;

    // one reader per peer: messages are handled strictly in arrival order
    loop {
        tokio::select! {
            frame = receiver.next() => match read_frame(&peer.id, frame) {
                Inbound::Envelope(envelope) => {
                    state.signaling_usecase.dispatch(&peer, envelope).await;
                }
                Inbound::Ignore => {}
                Inbound::Closed => break,
            },
            _ = &mut writer => {
                writer_finished = true;
                break;
            }
        }
    }

    match state.disconnect_peer_usecase.execute(&peer.id).await {
        Ok(Some(name)) => tracing::info!("Peer '{}' ({}) left the room", peer.id, name),
        Ok(None) => {}
        Err(e) => tracing::warn!("Failed to deregister: {}", e),
    }

    let _ = done_tx.send(());
    if !writer_finished && let Err(e) = writer.await {
        tracing::warn!("Writer task of peer '{}' failed: {}", peer.id, e);
    }

    tracing::info!("Peer '{}' disconnected", peer.id);
}
