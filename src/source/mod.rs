//! Source ingestion
//!
//! Everything on the producing side of the pipeline: the blocking pipe
//! reader and the queue that hands its lines to the broadcast engine.
//! This is the only bridge between the reader thread and the runtime; the
//! two sides share no other mutable state.

pub mod queue;
pub mod reader;

pub use queue::{line_channel, LineReceiver, LineSender, QueueClosed};
pub use reader::{ensure_fifo, SourceAdapter, DEFAULT_ABSENT_RETRY, DEFAULT_ERROR_RETRY};
