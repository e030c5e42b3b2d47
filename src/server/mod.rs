//! Server shell
//!
//! Owns the registry, starts the source reader, and runs the accept loop
//! and broadcast engine for the process lifetime.

pub mod config;
pub mod listener;

pub use config::{ServerConfig, DEFAULT_PIPE_PATH, DEFAULT_PORT};
pub use listener::PipecastServer;
