//! UI layer: HTTP routing and the WebSocket connection lifecycle.

mod handler;
mod server;
mod signal;
pub mod state;

pub use server::Server;
pub use signal::shutdown_signal;
