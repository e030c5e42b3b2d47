//! Broadcast engine
//!
//! Drains the decoupling queue and fans each line out to every registered
//! subscriber. One failed send marks that subscriber dead without touching
//! delivery to the rest; dead peers are unregistered after the pass so the
//! send loop never mutates the set it is iterating.

use std::sync::Arc;

use crate::registry::{ClientRegistry, Line};
use crate::source::LineReceiver;
use crate::stats::ServerStats;

/// Fans queued lines out to all live subscribers
///
/// Runs as a single cooperative loop on the runtime, interleaving with
/// connection handling. It has one state, draining, from start until the
/// queue closes at shutdown.
pub struct BroadcastEngine {
    registry: Arc<ClientRegistry>,
    rx: LineReceiver,
    stats: Arc<ServerStats>,
}

impl BroadcastEngine {
    /// Create an engine draining `rx` into `registry`'s members
    pub fn new(registry: Arc<ClientRegistry>, rx: LineReceiver, stats: Arc<ServerStats>) -> Self {
        Self {
            registry,
            rx,
            stats,
        }
    }

    /// Drain the queue until it closes
    pub async fn run(mut self) {
        while let Some(line) = self.rx.pop().await {
            self.broadcast(line).await;
        }

        tracing::debug!("Source queue closed, broadcast engine stopping");
    }

    /// Deliver one line to every subscriber in the current snapshot
    ///
    /// Subscribers registered after the snapshot miss this line and receive
    /// everything from the next one on.
    async fn broadcast(&self, line: Line) {
        let snapshot = self.registry.snapshot().await;
        self.stats.record_broadcast();

        if snapshot.is_empty() {
            return;
        }

        let mut dead = Vec::new();
        for handle in &snapshot {
            if handle.send(line.clone()).is_err() {
                dead.push(handle.id());
            }
        }

        tracing::trace!(
            bytes = line.len(),
            subscribers = snapshot.len(),
            failed = dead.len(),
            "Broadcast pass"
        );

        // Reap after the pass, not during it; a subscriber may already be
        // gone via its own close-detection path, which is fine.
        for id in dead {
            self.stats.record_send_failed();
            if self.registry.unregister(id).await {
                self.stats.record_peer_reaped();
                tracing::info!(subscriber = id, "Reaped dead subscriber");
            }
        }
    }
}
