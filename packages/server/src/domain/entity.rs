//! Domain entities.

use tokio::sync::mpsc::{self, error::TrySendError};

use super::{
    error::MessagePushError,
    value_object::{PeerId, PeerName, Timestamp},
};

/// Capacity of every peer's outbound queue
pub const OUTBOUND_QUEUE_CAPACITY: usize = 16;

/// Sending half of a peer's outbound queue. Only the peer's writer task drains it.
pub type PeerChannel = mpsc::Sender<String>;

/// One connected signaling client as seen by the hub
///
/// The transport itself is owned by the connection's writer task; the hub only
/// keeps the sending half of the outbound queue.
#[derive(Debug, Clone)]
pub struct Peer {
    pub id: PeerId,
    /// `None` until the peer joins the room, and again after it leaves
    pub name: Option<PeerName>,
    pub connected_at: Timestamp,
    outbound: PeerChannel,
}

impl Peer {
    pub fn new(id: PeerId, outbound: PeerChannel, connected_at: Timestamp) -> Self {
        Self {
            id,
            name: None,
            connected_at,
            outbound,
        }
    }

    pub fn is_joined(&self) -> bool {
        self.name.is_some()
    }

    /// Offer a serialized message to the outbound queue without waiting.
    ///
    /// A full queue drops the message and reports [`MessagePushError::QueueFull`].
    pub fn try_push(&self, message: String) -> Result<(), MessagePushError> {
        self.outbound.try_send(message).map_err(|e| match e {
            TrySendError::Full(_) => MessagePushError::QueueFull(self.id.to_string()),
            TrySendError::Closed(_) => MessagePushError::Disconnected(self.id.to_string()),
        })
    }
}

/// A joined peer as listed to other clients
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnlineUser {
    pub id: PeerId,
    pub name: PeerName,
}

/// Directed negotiation messages relayed between two peers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
}

impl SignalKind {
    /// Wire tag of this message kind
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Offer => "offer",
            SignalKind::Answer => "answer",
            SignalKind::IceCandidate => "ice-candidate",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "offer" => Some(SignalKind::Offer),
            "answer" => Some(SignalKind::Answer),
            "ice-candidate" => Some(SignalKind::IceCandidate),
            _ => None,
        }
    }
}
