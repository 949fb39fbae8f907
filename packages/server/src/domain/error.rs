//! Domain errors.

use thiserror::Error;

/// Validation errors raised while building value objects
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("invalid peer id: '{0}'")]
    InvalidPeerId(String),

    #[error("name must not be empty")]
    EmptyPeerName,

    #[error("name must be at most {max} characters")]
    PeerNameTooLong { max: usize, actual: usize },
}

/// Errors raised when offering a message to a peer's outbound queue
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("outbound queue of peer '{0}' is full")]
    QueueFull(String),

    #[error("peer '{0}' is disconnected")]
    Disconnected(String),

    #[error("failed to serialize message: {0}")]
    Serialization(String),
}
