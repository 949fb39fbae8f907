//! WebRTC signaling hub server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin signalhub-server
//! WEBRTC_CONN_SEC=30 WEBRTC_CONN_MAX=5 cargo run --bin signalhub-server -- --host 0.0.0.0 --port 3000
//! ```

use std::sync::Arc;

use clap::Parser;
use signalhub_server::{
    config::RateLimitConfig,
    infrastructure::{rate_limiter::SlidingWindowRateLimiter, registry::InMemoryPeerRegistry},
    ui::Server,
    usecase::{ConnectPeerUseCase, DisconnectPeerUseCase, GetHubStateUseCase, SignalingUseCase},
};
use signalhub_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "signalhub-server")]
#[command(about = "WebRTC signaling hub over WebSocket", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. Registry and rate limiter
    // 2. UseCases
    // 3. Server

    // 1. In-memory peer registry and per-address rate limiter
    let registry = Arc::new(InMemoryPeerRegistry::new());
    let rate_limit = RateLimitConfig::from_env();
    let rate_limiter = SlidingWindowRateLimiter::new(rate_limit);
    let sweeper = rate_limiter.start_sweeper();
    tracing::info!(
        "Rate limit: {} connections per {:?} per address",
        rate_limit.max_attempts,
        rate_limit.window
    );

    // 2. Create UseCases
    let connect_peer_usecase = Arc::new(ConnectPeerUseCase::new(
        registry.clone(),
        rate_limiter.clone(),
    ));
    let disconnect_peer_usecase = Arc::new(DisconnectPeerUseCase::new(registry.clone()));
    let signaling_usecase = Arc::new(SignalingUseCase::new(registry.clone()));
    let get_hub_state_usecase = Arc::new(GetHubStateUseCase::new(registry));

    // 3. Create and run the server
    let server = Server::new(
        connect_peer_usecase,
        disconnect_peer_usecase,
        signaling_usecase,
        get_hub_state_usecase,
    );
    let result = server.run(args.host, args.port).await;

    rate_limiter.close();
    if let Err(e) = sweeper.await {
        tracing::warn!("Rate limiter sweeper failed: {}", e);
    }

    if let Err(e) = result {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
