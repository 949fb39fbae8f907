//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::{
    infrastructure::dto::http::{HubStateDto, PeerSummaryDto},
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Debug endpoint listing the connected peers
pub async fn debug_hub_state(State(state): State<Arc<AppState>>) -> Json<HubStateDto> {
    let peers = state.get_hub_state_usecase.execute().await;

    // domain -> DTO
    let peers: Vec<PeerSummaryDto> = peers.into_iter().map(PeerSummaryDto::from).collect();

    Json(HubStateDto {
        peer_count: peers.len(),
        peers,
    })
}
