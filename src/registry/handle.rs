//! Subscriber handles
//!
//! A handle is the registry's view of one connected subscriber: a session id
//! plus a send capability. The underlying connection is owned by its
//! connection task; the handle only feeds that task's outbound queue.

use std::net::SocketAddr;

use tokio::sync::mpsc;

use super::line::Line;

/// Error returned when sending to a subscriber whose connection is gone
///
/// There is no transient variant: a failed send means the connection task
/// has dropped its receiver, and the subscriber is permanently dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerGone {
    /// Session id of the dead subscriber
    pub id: u64,
}

impl std::fmt::Display for PeerGone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Subscriber {} is gone", self.id)
    }
}

impl std::error::Error for PeerGone {}

/// Handle to one connected subscriber
///
/// Cloneable; all clones send into the same connection task.
#[derive(Debug, Clone)]
pub struct SubscriberHandle {
    id: u64,
    peer_addr: SocketAddr,
    tx: mpsc::UnboundedSender<Line>,
}

impl SubscriberHandle {
    /// Create a handle together with the receiving end of its outbound queue
    ///
    /// The listener hands the receiver to the connection task that owns the
    /// socket. Tests use this to build synthetic subscribers without a
    /// network stack.
    pub fn channel(id: u64, peer_addr: SocketAddr) -> (Self, mpsc::UnboundedReceiver<Line>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { id, peer_addr, tx }, rx)
    }

    /// Session id, unique for the life of the process
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Remote peer address
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Queue one line for delivery to this subscriber
    ///
    /// Never blocks. Fails if and only if the connection task has gone away;
    /// the caller should treat that as a permanently dead peer.
    pub fn send(&self, line: Line) -> Result<(), PeerGone> {
        self.tx.send(line).map_err(|_| PeerGone { id: self.id })
    }

    /// Whether the connection task has already dropped its receiver
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
