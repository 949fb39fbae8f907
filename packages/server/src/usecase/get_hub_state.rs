//! UseCase: hub state snapshot for operational inspection

use std::sync::Arc;

use crate::domain::{Peer, PeerRegistry};

pub struct GetHubStateUseCase {
    registry: Arc<dyn PeerRegistry>,
}

impl GetHubStateUseCase {
    pub fn new(registry: Arc<dyn PeerRegistry>) -> Self {
        Self { registry }
    }

    /// All connected peers, oldest connection first
    pub async fn execute(&self) -> Vec<Peer> {
        let mut peers = self.registry.list_peers().await;
        peers.sort_by_key(|peer| (peer.connected_at, peer.id));
        peers
    }
}
