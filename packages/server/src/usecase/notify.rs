//! Outbound helpers shared by the use cases.

use crate::{
    domain::{Peer, PeerId, PeerRegistry},
    infrastructure::dto::websocket::ServerMessage,
};

/// Serialize and offer a message to one peer. Failures are logged and dropped.
pub(crate) fn push(peer: &Peer, message: &ServerMessage) {
    let result = message.to_json().and_then(|json| peer.try_push(json));
    if let Err(e) = result {
        tracing::warn!("Failed to push message to peer '{}': {}", peer.id, e);
    }
}

/// Serialize once and offer a message to every peer except `sender`
pub(crate) async fn broadcast_except(
    registry: &dyn PeerRegistry,
    sender: &PeerId,
    message: &ServerMessage,
) -> usize {
    match message.to_json() {
        Ok(json) => registry.broadcast_except(sender, &json).await,
        Err(e) => {
            tracing::error!("Failed to serialize broadcast from '{}': {}", sender, e);
            0
        }
    }
}
