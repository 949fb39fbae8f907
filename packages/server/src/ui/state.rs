//! Server state shared by the handlers.

use std::sync::Arc;

use crate::usecase::{
    ConnectPeerUseCase, DisconnectPeerUseCase, GetHubStateUseCase, SignalingUseCase,
};

/// Shared application state
pub struct AppState {
    pub connect_peer_usecase: Arc<ConnectPeerUseCase>,
    pub disconnect_peer_usecase: Arc<DisconnectPeerUseCase>,
    pub signaling_usecase: Arc<SignalingUseCase>,
    pub get_hub_state_usecase: Arc<GetHubStateUseCase>,
}
