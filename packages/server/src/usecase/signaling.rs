//! UseCase: signaling message dispatch
//!
//! Per-peer state machine:
//!
//! ```text
//! Connected --join-room--> Joined --leave-room--> Connected
//!     \______________________\____ disconnect ____> (gone)
//! ```
//!
//! A protocol or validation failure is reported back to the sender as an
//! `error` message and never ends the session.

use std::sync::Arc;

use crate::{
    domain::{Peer, PeerId, PeerName, PeerRegistry},
    infrastructure::dto::websocket::{
        ClientMessage, Envelope, JoinRoomPayload, RelayPayload, RelayRequest, ServerMessage,
        UserInfo,
    },
};

use super::{error::SignalingError, notify};

/// Signaling use case
pub struct SignalingUseCase {
    registry: Arc<dyn PeerRegistry>,
}

impl SignalingUseCase {
    pub fn new(registry: Arc<dyn PeerRegistry>) -> Self {
        Self { registry }
    }

    /// Handle one inbound envelope from `caller`, answering with `error` on failure
    pub async fn dispatch(&self, caller: &Peer, envelope: Envelope) {
        let kind = envelope.kind.clone();
        let result = match ClientMessage::try_from(envelope) {
            Ok(message) => self.handle(caller, message).await,
            Err(e) => Err(e.into()),
        };

        if let Err(e) = result {
            tracing::debug!("Rejected '{}' from peer '{}': {:?}", kind, caller.id, e);
            notify::push(caller, &ServerMessage::error(e.to_string()));
        }
    }

    /// Handle one decoded message from `caller`
    ///
    /// `caller` is the connection's own handle; only its id and outbound queue are
    /// used, the current name is always read from the registry.
    pub async fn handle(&self, caller: &Peer, message: ClientMessage) -> Result<(), SignalingError> {
        match message {
            ClientMessage::GetOnlineUsers => {
                self.get_online_users(caller).await;
                Ok(())
            }
            ClientMessage::JoinRoom(payload) => self.join_room(caller, payload).await,
            ClientMessage::Relay(request) => self.relay(caller, request).await,
            ClientMessage::LeaveRoom => {
                self.leave_room(&caller.id).await;
                Ok(())
            }
        }
    }

    async fn get_online_users(&self, caller: &Peer) {
        let users = self.user_infos(None).await;
        notify::push(caller, &ServerMessage::OnlineUsersList(users));
    }

    async fn join_room(&self, caller: &Peer, payload: JoinRoomPayload) -> Result<(), SignalingError> {
        let name = PeerName::new(payload.user_name)?;

        self.registry
            .rename_peer(&caller.id, Some(name.clone()))
            .await
            .ok_or_else(|| SignalingError::NotRegistered(caller.id.to_string()))?;
        tracing::info!("Peer '{}' joined as '{}'", caller.id, name);

        let joined = ServerMessage::UserJoined(UserInfo {
            user_id: caller.id.to_string(),
            user_name: name.into_string(),
        });
        notify::broadcast_except(self.registry.as_ref(), &caller.id, &joined).await;

        let others = self.user_infos(Some(&caller.id)).await;
        notify::push(caller, &ServerMessage::CurrentUsers(others));

        Ok(())
    }

    async fn relay(&self, caller: &Peer, request: RelayRequest) -> Result<(), SignalingError> {
        let RelayRequest {
            kind,
            target,
            fields,
        } = request;

        let target_peer = match PeerId::parse(&target) {
            Ok(id) => self.registry.get_peer(&id).await,
            Err(_) => None,
        }
        .ok_or(SignalingError::TargetNotOnline(target))?;

        let message = ServerMessage::relay(
            kind,
            RelayPayload {
                sender: caller.id.to_string(),
                fields,
            },
        );
        notify::push(&target_peer, &message);
        tracing::debug!(
            "Relayed {} from '{}' to '{}'",
            kind.as_str(),
            caller.id,
            target_peer.id
        );

        Ok(())
    }

    /// Leave the room. Peers that never joined are left untouched and nobody is notified.
    async fn leave_room(&self, caller: &PeerId) {
        if let Some(Some(name)) = self.registry.rename_peer(caller, None).await {
            notify::broadcast_except(
                self.registry.as_ref(),
                caller,
                &ServerMessage::UserLeft(caller.to_string()),
            )
            .await;
            tracing::info!("Peer '{}' ({}) left the room", caller, name);
        }
    }

    async fn user_infos(&self, exclude: Option<&PeerId>) -> Vec<UserInfo> {
        self.registry
            .list_users()
            .await
            .into_iter()
            .filter(|user| Some(&user.id) != exclude)
            .map(UserInfo::from)
            .collect()
    }
}
