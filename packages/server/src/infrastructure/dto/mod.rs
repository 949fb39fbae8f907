//! Data Transfer Objects (DTOs) for the signaling hub.
//!
//! DTOs are organized by protocol:
//! - `websocket`: signaling envelopes exchanged over `/ws`
//! - `http`: HTTP API response DTOs

pub mod conversion;
pub mod http;
pub mod websocket;
