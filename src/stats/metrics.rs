//! Process-lifetime counters
//!
//! In-process accounting only; there is no exporter. The demo binary logs a
//! snapshot on shutdown.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by the engine and the listener
///
/// All updates are relaxed atomics; the counts are informational.
#[derive(Debug, Default)]
pub struct ServerStats {
    lines_broadcast: AtomicU64,
    sends_failed: AtomicU64,
    peers_reaped: AtomicU64,
    subscribers_connected: AtomicU64,
    subscribers_current: AtomicU64,
}

impl ServerStats {
    /// Create a zeroed counter set
    pub fn new() -> Self {
        Self::default()
    }

    /// One line taken off the queue and fanned out
    pub fn record_broadcast(&self) {
        self.lines_broadcast.fetch_add(1, Ordering::Relaxed);
    }

    /// One send attempt failed during a broadcast pass
    pub fn record_send_failed(&self) {
        self.sends_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// One dead subscriber removed by the engine
    pub fn record_peer_reaped(&self) {
        self.peers_reaped.fetch_add(1, Ordering::Relaxed);
    }

    /// One subscriber completed its handshake and registered
    pub fn record_subscriber_connected(&self) {
        self.subscribers_connected.fetch_add(1, Ordering::Relaxed);
        self.subscribers_current.fetch_add(1, Ordering::Relaxed);
    }

    /// One subscriber's connection task finished
    pub fn record_subscriber_disconnected(&self) {
        self.subscribers_current.fetch_sub(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            lines_broadcast: self.lines_broadcast.load(Ordering::Relaxed),
            sends_failed: self.sends_failed.load(Ordering::Relaxed),
            peers_reaped: self.peers_reaped.load(Ordering::Relaxed),
            subscribers_connected: self.subscribers_connected.load(Ordering::Relaxed),
            subscribers_current: self.subscribers_current.load(Ordering::Relaxed),
        }
    }
}

/// Plain copy of the counters at one instant
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Lines fanned out since start
    pub lines_broadcast: u64,
    /// Failed send attempts since start
    pub sends_failed: u64,
    /// Subscribers removed after a failed send
    pub peers_reaped: u64,
    /// Total subscribers ever registered
    pub subscribers_connected: u64,
    /// Subscribers registered right now
    pub subscribers_current: u64,
}
