//! In-memory peer registry.
//!
//! The hub keeps no persistent state: a restart starts from an empty map.
//! Reads (`get_peer`, `list_users`, broadcast) share the lock; only
//! `add_peer`, `remove_peer` and `rename_peer` take it exclusively. Enqueues
//! happen under the read lock but never wait, so a slow peer cannot stall it.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{MessagePushError, OnlineUser, Peer, PeerId, PeerName, PeerRegistry};

/// In-memory peer registry
#[derive(Default)]
pub struct InMemoryPeerRegistry {
    peers: RwLock<HashMap<PeerId, Peer>>,
}

impl InMemoryPeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PeerRegistry for InMemoryPeerRegistry {
    async fn add_peer(&self, peer: Peer) {
        let id = peer.id;
        let mut peers = self.peers.write().await;
        peers.insert(id, peer);
        tracing::debug!("Peer '{}' registered ({} online)", id, peers.len());
    }

    async fn remove_peer(&self, id: &PeerId) -> Option<Peer> {
        let mut peers = self.peers.write().await;
        let removed = peers.remove(id);
        if removed.is_some() {
            tracing::debug!("Peer '{}' unregistered ({} online)", id, peers.len());
        }
        removed
    }

    async fn get_peer(&self, id: &PeerId) -> Option<Peer> {
        self.peers.read().await.get(id).cloned()
    }

    async fn rename_peer(&self, id: &PeerId, name: Option<PeerName>) -> Option<Option<PeerName>> {
        let mut peers = self.peers.write().await;
        let peer = peers.get_mut(id)?;
        Some(std::mem::replace(&mut peer.name, name))
    }

    async fn list_users(&self) -> Vec<OnlineUser> {
        self.peers
            .read()
            .await
            .values()
            .filter_map(|peer| {
                peer.name.as_ref().map(|name| OnlineUser {
                    id: peer.id,
                    name: name.clone(),
                })
            })
            .collect()
    }

    async fn list_peers(&self) -> Vec<Peer> {
        self.peers.read().await.values().cloned().collect()
    }

    async fn broadcast_except(&self, sender: &PeerId, message: &str) -> usize {
        let peers = self.peers.read().await;
        let mut delivered = 0;

        for peer in peers.values().filter(|peer| &peer.id != sender) {
            match peer.try_push(message.to_string()) {
                Ok(()) => delivered += 1,
                // best-effort: a full queue only loses this message
                Err(MessagePushError::QueueFull(id)) => {
                    tracing::debug!("Outbound queue of '{}' is full, dropping broadcast", id);
                }
                Err(e) => tracing::debug!("Skipping broadcast target: {}", e),
            }
        }

        delivered
    }
}
