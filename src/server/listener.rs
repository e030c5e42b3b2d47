//! Pipecast server listener
//!
//! Handles the TCP accept loop, WebSocket handshakes, and per-connection
//! tasks, and wires the source reader and broadcast engine together.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Semaphore};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use crate::engine::BroadcastEngine;
use crate::error::{Error, Result};
use crate::registry::{ClientRegistry, Line, SubscriberHandle};
use crate::server::config::ServerConfig;
use crate::source::{ensure_fifo, line_channel, SourceAdapter};
use crate::stats::ServerStats;

/// Pipe-to-WebSocket broadcast server
pub struct PipecastServer {
    config: ServerConfig,
    registry: Arc<ClientRegistry>,
    stats: Arc<ServerStats>,
    next_session_id: AtomicU64,
    connection_semaphore: Option<Arc<Semaphore>>,
}

impl PipecastServer {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        let connection_semaphore = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };

        Self {
            config,
            registry: Arc::new(ClientRegistry::new()),
            stats: Arc::new(ServerStats::new()),
            next_session_id: AtomicU64::new(1),
            connection_semaphore,
        }
    }

    /// Get a reference to the client registry
    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    /// Get a reference to the server counters
    pub fn stats(&self) -> &Arc<ServerStats> {
        &self.stats
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Run the server
    ///
    /// This method blocks until the server is shut down.
    pub async fn run(&self) -> Result<()> {
        let (listener, engine) = self.bootstrap().await?;

        tokio::select! {
            _ = engine.run() => Ok(()),
            result = self.accept_loop(&listener) => result,
        }
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let (listener, engine) = self.bootstrap().await?;

        tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            _ = engine.run() => Ok(()),
            result = self.accept_loop(&listener) => result,
        }
    }

    /// Create the pipe, start the reader thread, and bind the listener
    async fn bootstrap(&self) -> Result<(TcpListener, BroadcastEngine)> {
        if self.config.create_pipe {
            ensure_fifo(&self.config.pipe_path).map_err(|source| Error::PipeCreate {
                path: self.config.pipe_path.clone(),
                source,
            })?;
        }

        let (line_tx, line_rx) = line_channel();

        SourceAdapter::new(&self.config.pipe_path, line_tx)
            .absent_retry(self.config.pipe_absent_retry)
            .error_retry(self.config.pipe_error_retry)
            .spawn()?;

        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(
            addr = %self.config.bind_addr,
            pipe = %self.config.pipe_path.display(),
            "Pipecast server listening"
        );

        let engine = BroadcastEngine::new(
            Arc::clone(&self.registry),
            line_rx,
            Arc::clone(&self.stats),
        );

        Ok((listener, engine))
    }

    async fn accept_loop(&self, listener: &TcpListener) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_connection(socket, peer_addr).await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    async fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        // Check connection limit
        let permit = if let Some(ref sem) = self.connection_semaphore {
            match sem.clone().try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    tracing::warn!(peer = %peer_addr, "Connection rejected: limit reached");
                    return;
                }
            }
        } else {
            None
        };

        // Generate session ID
        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(
            session_id = session_id,
            peer = %peer_addr,
            "New connection"
        );

        if self.config.tcp_nodelay {
            if let Err(e) = socket.set_nodelay(true) {
                tracing::debug!(session_id = session_id, error = %e, "Failed to set TCP_NODELAY");
            }
        }

        let registry = Arc::clone(&self.registry);
        let stats = Arc::clone(&self.stats);

        tokio::spawn(async move {
            // Held for the lifetime of the connection
            let _permit = permit;

            // The handshake protocol is the transport's concern; a socket
            // that fails it never becomes a subscriber.
            let ws = match tokio_tungstenite::accept_async(socket).await {
                Ok(ws) => ws,
                Err(e) => {
                    tracing::debug!(
                        session_id = session_id,
                        error = %e,
                        "WebSocket handshake failed"
                    );
                    return;
                }
            };

            let (handle, line_rx) = SubscriberHandle::channel(session_id, peer_addr);
            registry.register(handle).await;
            stats.record_subscriber_connected();

            serve_subscriber(ws, line_rx, session_id).await;

            // Close-detection path; the engine may already have reaped this
            // id after a failed send, and double removal is a no-op.
            registry.unregister(session_id).await;
            stats.record_subscriber_disconnected();

            tracing::debug!(session_id = session_id, "Connection closed");
        });
    }
}

/// Relay queued lines to one subscriber until it goes away
///
/// Each line becomes one outbound text message, verbatim. Inbound frames
/// carry nothing we care about; they are drained so close frames and read
/// errors are noticed promptly.
async fn serve_subscriber(
    ws: WebSocketStream<TcpStream>,
    mut line_rx: mpsc::UnboundedReceiver<Line>,
    session_id: u64,
) {
    let (mut sink, mut stream) = ws.split();

    loop {
        tokio::select! {
            line = line_rx.recv() => {
                let Some(line) = line else { break };

                if let Err(e) = sink.send(Message::Text(line.as_str().to_owned())).await {
                    tracing::debug!(
                        session_id = session_id,
                        error = %e,
                        "Send to subscriber failed"
                    );
                    break;
                }
            }
            inbound = stream.next() => {
                match inbound {
                    Some(Ok(msg)) if msg.is_close() => break,
                    Some(Ok(_)) => {} // subscribers have nothing to say
                    Some(Err(e)) => {
                        tracing::debug!(
                            session_id = session_id,
                            error = %e,
                            "Subscriber read failed"
                        );
                        break;
                    }
                    None => break,
                }
            }
        }
    }
}
