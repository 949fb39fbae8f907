//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

/// Snapshot of the hub for `/debug/hub`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubStateDto {
    pub peer_count: usize,
    pub peers: Vec<PeerSummaryDto>,
}

/// One connected peer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerSummaryDto {
    pub peer_id: String,
    /// `None` while the peer has not joined
    pub user_name: Option<String>,
    /// RFC 3339
    pub connected_at: String,
}
