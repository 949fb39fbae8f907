//! Peer registry trait.
//!
//! The hub's directory of connected peers. Use cases depend on this trait;
//! the in-memory implementation lives in the infrastructure layer.

use async_trait::async_trait;

use super::{OnlineUser, Peer, PeerId, PeerName};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PeerRegistry: Send + Sync {
    /// Register a peer under its id
    async fn add_peer(&self, peer: Peer);

    /// Remove a peer, returning it if it was registered
    async fn remove_peer(&self, id: &PeerId) -> Option<Peer>;

    /// Look up a peer by id
    async fn get_peer(&self, id: &PeerId) -> Option<Peer>;

    /// Set or clear a peer's display name, returning the previous one.
    ///
    /// Returns `None` when the peer is not registered.
    async fn rename_peer(&self, id: &PeerId, name: Option<PeerName>) -> Option<Option<PeerName>>;

    /// Snapshot of every joined peer. Anonymous peers are excluded.
    async fn list_users(&self) -> Vec<OnlineUser>;

    /// Snapshot of every registered peer
    async fn list_peers(&self) -> Vec<Peer>;

    /// Offer `message` to every registered peer except `sender`.
    ///
    /// Delivery is best-effort: peers whose queue is full are skipped.
    /// Returns how many peers accepted the message.
    async fn broadcast_except(&self, sender: &PeerId, message: &str) -> usize;
}
