//! UseCase: peer disconnection

use std::sync::Arc;

use crate::{
    domain::{PeerId, PeerName, PeerRegistry},
    infrastructure::dto::websocket::ServerMessage,
};

use super::{error::DisconnectError, notify};

/// Peer disconnection use case
pub struct DisconnectPeerUseCase {
    registry: Arc<dyn PeerRegistry>,
}

impl DisconnectPeerUseCase {
    pub fn new(registry: Arc<dyn PeerRegistry>) -> Self {
        Self { registry }
    }

    /// Deregister a peer whose reader loop has ended.
    ///
    /// The peer is removed first so nobody can address it anymore; if it had
    /// joined, the remaining peers then receive one `user-left`.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(name))` - the peer had joined under `name`
    /// * `Ok(None)` - the peer was anonymous
    /// * `Err(DisconnectError)` - the peer was not registered
    pub async fn execute(&self, id: &PeerId) -> Result<Option<PeerName>, DisconnectError> {
        let peer = self
            .registry
            .remove_peer(id)
            .await
            .ok_or_else(|| DisconnectError::PeerNotFound(id.to_string()))?;

        if peer.is_joined() {
            let notified = notify::broadcast_except(
                self.registry.as_ref(),
                id,
                &ServerMessage::UserLeft(id.to_string()),
            )
            .await;
            tracing::debug!("Broadcasted user-left for '{}' to {} peers", id, notified);
        }

        Ok(peer.name)
    }
}
