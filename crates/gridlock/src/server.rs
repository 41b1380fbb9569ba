//! `Server` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → registry. The server
//! owns the [`RoomRegistry`] explicitly; it is constructed here at
//! startup and reachable only through the shared state, never as a
//! global.

use std::sync::Arc;

use gridlock_protocol::JsonCodec;
use gridlock_room::RoomRegistry;
use gridlock_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::GridlockError;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState {
    pub(crate) registry: Mutex<RoomRegistry>,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a Gridlock server.
pub struct ServerBuilder {
    bind_addr: String,
}

impl ServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Binds the transport and builds the server.
    pub async fn build(self) -> Result<Server, GridlockError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            registry: Mutex::new(RoomRegistry::new()),
            codec: JsonCodec,
        });

        Ok(Server { transport, state })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Gridlock server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct Server {
    transport: WebSocketTransport,
    state: Arc<ServerState>,
}

impl Server {
    /// Creates a new builder.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop.
    ///
    /// Each accepted connection gets its own handler task. Runs until the
    /// process is terminated; a failed accept is logged, not fatal.
    pub async fn run(mut self) -> Result<(), GridlockError> {
        tracing::info!("Gridlock server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection(conn, state).await
                        {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
