//! # pipecast
//!
//! Bridges a single blocking, line-oriented source (a named pipe written by
//! an external process) to any number of WebSocket subscribers. The writer
//! never waits on subscribers, and one broken subscriber never affects the
//! rest.
//!
//! # Architecture
//!
//! ```text
//! external writer ──► named pipe
//!                         │ blocking open/read (dedicated thread)
//!                         ▼
//!                   SourceAdapter ──► line_channel (unbounded, FIFO)
//!                                          │ pop().await
//!                                          ▼
//!                                   BroadcastEngine
//!                                          │ snapshot()
//!                                          ▼
//!                                   ClientRegistry ◄── register/unregister
//!                                          │                  ▲
//!                          per-subscriber queues               │
//!                         ┌────────────┼────────────┐          │
//!                         ▼            ▼            ▼          │
//!                    [conn task]  [conn task]  [conn task] ────┘
//!                         │            │            │
//!                     WebSocket    WebSocket    WebSocket
//! ```
//!
//! The reader thread and the runtime share nothing except the line channel.
//! A subscriber whose send fails is removed permanently; a reconnecting
//! peer becomes a fresh subscriber. Lines reach every surviving subscriber
//! in the exact order they were read from the pipe.
//!
//! # Example
//!
//! ```no_run
//! use pipecast::{PipecastServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> pipecast::Result<()> {
//!     let config = ServerConfig::default()
//!         .pipe_path("/tmp/pipecast.pipe")
//!         .bind("0.0.0.0:8083".parse().unwrap());
//!
//!     PipecastServer::new(config).run().await
//! }
//! ```

pub mod engine;
pub mod error;
pub mod registry;
pub mod server;
pub mod source;
pub mod stats;

pub use engine::BroadcastEngine;
pub use error::{Error, Result};
pub use registry::{ClientRegistry, Line, SubscriberHandle};
pub use server::{PipecastServer, ServerConfig};
pub use stats::{ServerStats, StatsSnapshot};
