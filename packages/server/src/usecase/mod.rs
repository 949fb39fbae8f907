//! UseCase layer: the hub's operations, independent of the transport.

pub mod connect_peer;
pub mod disconnect_peer;
pub mod error;
pub mod get_hub_state;
mod notify;
pub mod signaling;

pub use connect_peer::ConnectPeerUseCase;
pub use disconnect_peer::DisconnectPeerUseCase;
pub use error::{ConnectError, DisconnectError, SignalingError};
pub use get_hub_state::GetHubStateUseCase;
pub use signaling::SignalingUseCase;
