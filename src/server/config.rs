//! Server configuration

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::source::{DEFAULT_ABSENT_RETRY, DEFAULT_ERROR_RETRY};

/// Well-known default pipe path
pub const DEFAULT_PIPE_PATH: &str = "/tmp/pipecast.pipe";

/// Well-known default port
pub const DEFAULT_PORT: u16 = 8083;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Path of the named pipe to read lines from
    pub pipe_path: PathBuf,

    /// Create the pipe at startup if it does not exist
    pub create_pipe: bool,

    /// Delay before re-checking a pipe path that does not exist yet
    pub pipe_absent_retry: Duration,

    /// Delay before reopening the pipe after an open/read error
    pub pipe_error_retry: Duration,

    /// Maximum concurrent connections (0 = unlimited)
    pub max_connections: usize,

    /// Enable TCP_NODELAY (disable Nagle's algorithm)
    pub tcp_nodelay: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            pipe_path: PathBuf::from(DEFAULT_PIPE_PATH),
            create_pipe: true,
            pipe_absent_retry: DEFAULT_ABSENT_RETRY,
            pipe_error_retry: DEFAULT_ERROR_RETRY,
            max_connections: 0, // Unlimited
            tcp_nodelay: true,  // Lines should go out immediately
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the pipe path
    pub fn pipe_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.pipe_path = path.into();
        self
    }

    /// Don't create the pipe at startup; rely on the writer to create it
    pub fn skip_pipe_creation(mut self) -> Self {
        self.create_pipe = false;
        self
    }

    /// Set the retry delay for a pipe path that does not exist yet
    pub fn pipe_absent_retry(mut self, delay: Duration) -> Self {
        self.pipe_absent_retry = delay;
        self
    }

    /// Set the retry delay after a pipe open/read error
    pub fn pipe_error_retry(mut self, delay: Duration) -> Self {
        self.pipe_error_retry = delay;
        self
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set TCP_NODELAY
    pub fn tcp_nodelay(mut self, enabled: bool) -> Self {
        self.tcp_nodelay = enabled;
        self
    }
}
