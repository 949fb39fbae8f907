//! UseCase errors.

use thiserror::Error;

use crate::{domain::ValueObjectError, infrastructure::dto::websocket::ProtocolError};

/// Connection admission errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("too many connections from {0}")]
    RateLimited(String),
}

/// Disconnection errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisconnectError {
    #[error("peer '{0}' is not registered")]
    PeerNotFound(String),
}

/// Recoverable signaling errors. The display string is sent to the peer as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalingError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    InvalidName(#[from] ValueObjectError),

    #[error("target not online")]
    TargetNotOnline(String),

    #[error("peer is not registered")]
    NotRegistered(String),
}
