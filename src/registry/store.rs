//! Client registry implementation
//!
//! The shared set of live subscribers. The accept path registers handles,
//! the broadcast engine snapshots them for fanout and unregisters the ones
//! whose sends fail, and connection tasks unregister on close detection.

use std::collections::HashMap;

use tokio::sync::RwLock;

use super::handle::SubscriberHandle;

/// Set of currently connected subscribers, keyed by session id
///
/// Thread-safe via `RwLock`. A handle present in the set is assumed
/// deliverable until a send to it fails.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: RwLock<HashMap<u64, SubscriberHandle>>,
}

impl ClientRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber
    ///
    /// Idempotent: registering an id that is already present leaves the
    /// existing entry untouched.
    pub async fn register(&self, handle: SubscriberHandle) {
        let mut clients = self.clients.write().await;
        let count = clients.len();

        if let std::collections::hash_map::Entry::Vacant(entry) = clients.entry(handle.id()) {
            tracing::info!(
                subscriber = handle.id(),
                peer = %handle.peer_addr(),
                subscribers = count + 1,
                "Subscriber registered"
            );
            entry.insert(handle);
        }
    }

    /// Remove a subscriber if present
    ///
    /// Returns whether a handle was removed. A no-op when the id is absent,
    /// so the failed-send path and the close-detection path can both call
    /// this without coordinating.
    pub async fn unregister(&self, id: u64) -> bool {
        let mut clients = self.clients.write().await;

        if clients.remove(&id).is_some() {
            tracing::info!(
                subscriber = id,
                subscribers = clients.len(),
                "Subscriber unregistered"
            );
            true
        } else {
            false
        }
    }

    /// Point-in-time copy of the current members
    ///
    /// Safe to iterate without holding any registry lock; concurrent
    /// register/unregister calls proceed against the live set.
    pub async fn snapshot(&self) -> Vec<SubscriberHandle> {
        self.clients.read().await.values().cloned().collect()
    }

    /// Number of currently registered subscribers
    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Whether no subscribers are registered
    pub async fn is_empty(&self) -> bool {
        self.clients.read().await.is_empty()
    }
}
