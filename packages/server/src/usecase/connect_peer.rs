//! UseCase: peer admission and registration

use std::sync::Arc;

use signalhub_shared::time::now_millis;

use crate::{
    domain::{ConnectionRateLimiter, Peer, PeerChannel, PeerIdFactory, PeerRegistry, Timestamp},
    infrastructure::dto::websocket::ServerMessage,
};

use super::{error::ConnectError, notify};

/// Peer connection use case
pub struct ConnectPeerUseCase {
    registry: Arc<dyn PeerRegistry>,
    rate_limiter: Arc<dyn ConnectionRateLimiter>,
}

impl ConnectPeerUseCase {
    pub fn new(
        registry: Arc<dyn PeerRegistry>,
        rate_limiter: Arc<dyn ConnectionRateLimiter>,
    ) -> Self {
        Self {
            registry,
            rate_limiter,
        }
    }

    /// Record a connection attempt from `address` and decide whether to accept it.
    ///
    /// Must be called before the transport is upgraded.
    pub fn admit(&self, address: &str) -> Result<(), ConnectError> {
        if self.rate_limiter.is_allowed(address) {
            Ok(())
        } else {
            Err(ConnectError::RateLimited(address.to_string()))
        }
    }

    /// Register a new peer around its outbound queue and greet it with `connected`.
    ///
    /// # Returns
    ///
    /// The registered peer. Its clone stays with the connection as the handle to
    /// its own queue.
    pub async fn execute(&self, outbound: PeerChannel) -> Peer {
        let peer = Peer::new(
            PeerIdFactory::generate(),
            outbound,
            Timestamp::new(now_millis()),
        );

        self.registry.add_peer(peer.clone()).await;
        notify::push(
            &peer,
            &ServerMessage::Connected {
                id: peer.id.to_string(),
            },
        );

        peer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{entity::OUTBOUND_QUEUE_CAPACITY, rate_limiter::MockConnectionRateLimiter},
        infrastructure::registry::InMemoryPeerRegistry,
    };
    use serde_json::{Value, json};
    use tokio::sync::mpsc;

    fn create_usecase(allowed: bool) -> (ConnectPeerUseCase, Arc<InMemoryPeerRegistry>) {
        let registry = Arc::new(InMemoryPeerRegistry::new());
        let mut rate_limiter = MockConnectionRateLimiter::new();
        rate_limiter
            .expect_is_allowed()
            .withf(|address| address == "10.0.0.1")
            .return_const(allowed);
        (
            ConnectPeerUseCase::new(registry.clone(), Arc::new(rate_limiter)),
            registry,
        )
    }

    #[test]
    fn test_admit_accepts_allowed_address() {
        // Test: an address within its budget is admitted
        let (usecase, _registry) = create_usecase(true);
        assert_eq!(usecase.admit("10.0.0.1"), Ok(()));
    }

    #[test]
    fn test_admit_rejects_rate_limited_address() {
        // Test: an address over its budget is refused
        let (usecase, _registry) = create_usecase(false);
        assert_eq!(
            usecase.admit("10.0.0.1"),
            Err(ConnectError::RateLimited("10.0.0.1".to_string()))
        );
    }

    #[tokio::test]
    async fn test_execute_registers_peer_and_sends_connected() {
        // Test: a new peer is registered anonymously and told its id
        // given:
        let (usecase, registry) = create_usecase(true);
        let (tx, mut rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);

        // when:
        let peer = usecase.execute(tx).await;

        // then:
        let registered = registry.get_peer(&peer.id).await.unwrap();
        assert!(!registered.is_joined());

        let greeting: Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(
            greeting,
            json!({"type": "connected", "payload": {"id": peer.id.to_string()}})
        );
    }

    #[tokio::test]
    async fn test_execute_generates_fresh_ids() {
        // Test: every connection gets its own id
        // given:
        let (usecase, registry) = create_usecase(true);
        let (tx1, _rx1) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        let (tx2, _rx2) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);

        // when:
        let first = usecase.execute(tx1).await;
        let second = usecase.execute(tx2).await;

        // then:
        assert_ne!(first.id, second.id);
        assert_eq!(registry.list_peers().await.len(), 2);
    }
}
