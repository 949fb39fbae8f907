//! Server execution logic.

use std::{future::Future, net::SocketAddr, sync::Arc};

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::usecase::{
    ConnectPeerUseCase, DisconnectPeerUseCase, GetHubStateUseCase, SignalingUseCase,
};

use super::{
    handler::{debug_hub_state, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// WebRTC signaling server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(
///     connect_peer_usecase,
///     disconnect_peer_usecase,
///     signaling_usecase,
///     get_hub_state_usecase,
/// );
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    pub fn new(
        connect_peer_usecase: Arc<ConnectPeerUseCase>,
        disconnect_peer_usecase: Arc<DisconnectPeerUseCase>,
        signaling_usecase: Arc<SignalingUseCase>,
        get_hub_state_usecase: Arc<GetHubStateUseCase>,
    ) -> Self {
        Self {
            state: Arc::new(AppState {
                connect_peer_usecase,
                disconnect_peer_usecase,
                signaling_usecase,
                get_hub_state_usecase,
            }),
        }
    }

    /// Build the router
    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket endpoint
            .route("/ws", get(websocket_handler))
            // HTTP endpoints
            .route("/api/health", get(health_check))
            .route("/debug/hub", get(debug_hub_state))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the signaling server until Ctrl+C / SIGTERM
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!(
            "WebRTC signaling server listening on {}",
            listener.local_addr()?
        );
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();

        // peer addresses feed the rate limiter
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
    }
}
