//! `FaceoffServer` builder and server loop.
//!
//! This is the entry point for running a Faceoff server. It ties together
//! the layers: transport → protocol → room registry → game, plus the HTTP
//! API on its own listener.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use faceoff_game::{CategoryConfig, CategorySource, GameConfig, ResilientCategories};
use faceoff_protocol::JsonCodec;
use faceoff_room::{RoomConfig, RoomRegistry};
use faceoff_transport::{Transport, WebSocketTransport};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::handler::handle_connection;
use crate::{FaceoffError, ServerConfig, http};

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C> {
    pub(crate) registry: Arc<RoomRegistry<C>>,
    pub(crate) codec: JsonCodec,
    pub(crate) idle_timeout: Duration,
}

/// Builder for configuring and starting a Faceoff server.
///
/// # Example
///
/// ```rust,ignore
/// use faceoff::prelude::*;
///
/// let server = FaceoffServer::builder()
///     .bind("0.0.0.0:8000")
///     .http_bind("0.0.0.0:8001")
///     .build(StaticCategories::new())
///     .await?;
/// server.run().await
/// ```
#[derive(Debug, Clone, Default)]
pub struct FaceoffServerBuilder {
    config: ServerConfig,
}

impl FaceoffServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from a full configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the WebSocket listener address.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.ws_addr = addr.to_string();
        self
    }

    /// Sets the HTTP API listener address.
    pub fn http_bind(mut self, addr: &str) -> Self {
        self.config.http_addr = addr.to_string();
        self
    }

    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.config.room = config;
        self
    }

    pub fn game_config(mut self, config: GameConfig) -> Self {
        self.config.game = config;
        self
    }

    pub fn category_config(mut self, config: CategoryConfig) -> Self {
        self.config.categories = config;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// Binds both listeners. Category labels come from `source`, retried
    /// and backed by the static pool.
    pub async fn build<S: CategorySource>(
        self,
        source: S,
    ) -> Result<FaceoffServer<ResilientCategories<S>>, FaceoffError> {
        let ServerConfig {
            ws_addr,
            http_addr,
            idle_timeout,
            room,
            game,
            categories,
        } = self.config;

        let transport = WebSocketTransport::bind(&ws_addr).await?;
        let http_listener = TcpListener::bind(&http_addr).await?;

        let categories = ResilientCategories::new(source, categories);
        let state = Arc::new(ServerState {
            registry: Arc::new(RoomRegistry::new(room, game, categories)),
            codec: JsonCodec,
            idle_timeout,
        });

        Ok(FaceoffServer {
            transport,
            http_listener,
            state,
        })
    }
}

/// A bound Faceoff server.
///
/// Call [`run()`](Self::run) or [`run_until()`](Self::run_until) to start
/// accepting connections.
pub struct FaceoffServer<C> {
    transport: WebSocketTransport,
    http_listener: TcpListener,
    state: Arc<ServerState<C>>,
}

impl FaceoffServer<()> {
    /// Creates a new builder.
    pub fn builder() -> FaceoffServerBuilder {
        FaceoffServerBuilder::new()
    }
}

impl<C: CategorySource> FaceoffServer<C> {
    /// Returns the WebSocket listener's address.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Returns the HTTP listener's address.
    pub fn http_addr(&self) -> std::io::Result<SocketAddr> {
        self.http_listener.local_addr()
    }

    /// The room registry both listeners share.
    pub fn registry(&self) -> Arc<RoomRegistry<C>> {
        Arc::clone(&self.state.registry)
    }

    /// Runs until the process is terminated.
    pub async fn run(self) -> Result<(), FaceoffError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop, the HTTP API, and the expiry sweeper until
    /// `shutdown` resolves, then stops every room.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), FaceoffError>
    where
        F: Future<Output = ()> + Send,
    {
        let FaceoffServer {
            mut transport,
            http_listener,
            state,
        } = self;

        tracing::info!(
            ws_addr = %transport.local_addr()?,
            http_addr = %http_listener.local_addr()?,
            "Faceoff server running"
        );

        let (stop_http, http_stopped) = oneshot::channel::<()>();
        let app = http::router(Arc::clone(&state.registry));
        let http_task = tokio::spawn(async move {
            axum::serve(http_listener, app)
                .with_graceful_shutdown(async {
                    let _ = http_stopped.await;
                })
                .await
        });
        let sweeper = state.registry.spawn_sweeper();

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }

        tracing::info!("Faceoff server shutting down");
        sweeper.abort();
        let _ = stop_http.send(());
        match http_task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "HTTP server failed"),
            Err(e) => tracing::error!(error = %e, "HTTP server task failed"),
        }
        state.registry.shutdown_all().await;
        transport.shutdown().await?;
        Ok(())
    }
}
