//! Subscriber registry
//!
//! The registry tracks every live subscriber so the broadcast engine can
//! fan each line out to all of them.
//!
//! # Architecture
//!
//! ```text
//!                        Arc<ClientRegistry>
//!                  ┌───────────────────────────┐
//!                  │ clients: HashMap<u64,     │
//!                  │   SubscriberHandle {      │
//!                  │     tx: mpsc::Sender,     │
//!                  │   }                       │
//!                  │ >                         │
//!                  └────────────┬──────────────┘
//!                               │ snapshot()
//!                               ▼
//!                        BroadcastEngine
//!               handle.send(line) per subscriber
//!         ┌─────────────────────┼─────────────────────┐
//!         ▼                     ▼                     ▼
//!   [conn task]           [conn task]           [conn task]
//!   rx → WebSocket        rx → WebSocket        rx → WebSocket
//! ```
//!
//! # Cheap fanout
//!
//! `Line` holds its text behind `Arc<str>`, so a broadcast to N subscribers
//! clones a refcount N times and the allocation once (when the record is
//! read off the pipe).

pub mod handle;
pub mod line;
pub mod store;

pub use handle::{PeerGone, SubscriberHandle};
pub use line::Line;
pub use store::ClientRegistry;
