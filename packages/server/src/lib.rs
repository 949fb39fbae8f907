//! WebRTC signaling hub library.
//!
//! Accepts WebSocket connections, tracks connected peers, relays
//! offer / answer / ICE candidate messages between them by id, broadcasts
//! room presence, and rate-limits new connections per source address.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
