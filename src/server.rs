//! TCP accept loop and shared server state

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};

use crate::handler::handle_connection;
use crate::registry::Registry;
use crate::router::Router;
use crate::session::SessionNegotiator;
use crate::user::peer_writer;

/// Shared state handed to every connection worker
///
/// Cloning is cheap; all clones see the same registry.
#[derive(Clone)]
pub struct ChatServer {
    pub registry: Arc<Registry>,
    pub router: Router,
    pub negotiator: SessionNegotiator,
}

impl ChatServer {
    pub fn new() -> Self {
        let registry = Arc::new(Registry::new());
        let router = Router::new(registry.clone());
        let negotiator = SessionNegotiator::new(router.clone());
        Self {
            registry,
            router,
            negotiator,
        }
    }

    /// Accept connections forever, one worker task per socket
    ///
    /// Nothing caps the number of accepted connections, so the worker
    /// task count grows without bound as clients connect.
    pub async fn run(self, listener: TcpListener) {
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    info!("New connection from {}", addr);
                    let (reader, writer) = stream.into_split();
                    let server = self.clone();
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection(reader, peer_writer(writer), addr, server).await
                        {
                            error!("Connection handler error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}

impl Default for ChatServer {
    fn default() -> Self {
        Self::new()
    }
}
