//! Request handlers.

pub mod http;
pub mod websocket;

pub use http::{debug_hub_state, health_check};
pub use websocket::websocket_handler;
