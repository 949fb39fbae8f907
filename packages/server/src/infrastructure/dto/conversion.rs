//! Conversion logic between DTOs and domain entities.

use signalhub_shared::time::timestamp_to_rfc3339;

use crate::domain::{OnlineUser, Peer};
use crate::infrastructure::dto::{http, websocket};

// ========================================
// Domain Entity → DTO
// ========================================

impl From<OnlineUser> for websocket::UserInfo {
    fn from(user: OnlineUser) -> Self {
        Self {
            user_id: user.id.to_string(),
            user_name: user.name.into_string(),
        }
    }
}

impl From<Peer> for http::PeerSummaryDto {
    fn from(peer: Peer) -> Self {
        Self {
            peer_id: peer.id.to_string(),
            user_name: peer.name.map(|name| name.into_string()),
            connected_at: timestamp_to_rfc3339(peer.connected_at.value()),
        }
    }
}
