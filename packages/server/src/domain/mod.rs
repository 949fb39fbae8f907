//! Domain layer: peers, their identity and the collaborator traits the hub depends on.

pub mod entity;
pub mod error;
pub mod rate_limiter;
pub mod registry;
pub mod value_object;

pub use entity::{OnlineUser, Peer, PeerChannel, SignalKind};
pub use error::{MessagePushError, ValueObjectError};
pub use rate_limiter::ConnectionRateLimiter;
pub use registry::PeerRegistry;
pub use value_object::{PeerId, PeerIdFactory, PeerName, Timestamp};
