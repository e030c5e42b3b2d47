//! Thread-to-runtime handoff queue
//!
//! Bridges the blocking reader thread and the broadcast engine. The sender
//! side never blocks and is safe to use from a plain thread; the receiver
//! side suspends cooperatively on the tokio runtime. FIFO, unbounded: a
//! line is never dropped or reordered between a successful push and a later
//! pop.

use tokio::sync::mpsc;

use crate::registry::Line;

/// Error returned by [`LineSender::push`] when the consumer is gone
///
/// Only happens at process shutdown, when the broadcast engine has been
/// dropped; the reader thread uses it as its exit signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueClosed;

impl std::fmt::Display for QueueClosed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Line queue consumer is gone")
    }
}

impl std::error::Error for QueueClosed {}

/// Producer side of the decoupling queue
#[derive(Debug, Clone)]
pub struct LineSender {
    tx: mpsc::UnboundedSender<Line>,
}

impl LineSender {
    /// Append a line to the tail of the queue
    ///
    /// Never blocks and never waits on the consumer, so the reader thread
    /// cannot stall delivery to subscribers.
    pub fn push(&self, line: Line) -> Result<(), QueueClosed> {
        self.tx.send(line).map_err(|_| QueueClosed)
    }
}

/// Consumer side of the decoupling queue
#[derive(Debug)]
pub struct LineReceiver {
    rx: mpsc::UnboundedReceiver<Line>,
}

impl LineReceiver {
    /// Wait for the oldest queued line
    ///
    /// Returns `None` only once every sender is gone and the queue has
    /// drained.
    pub async fn pop(&mut self) -> Option<Line> {
        self.rx.recv().await
    }
}

/// Create a connected sender/receiver pair
pub fn line_channel() -> (LineSender, LineReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (LineSender { tx }, LineReceiver { rx })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_fifo_order() {
        let (tx, mut rx) = line_channel();

        tx.push(Line::from("first")).unwrap();
        tx.push(Line::from("second")).unwrap();
        tx.push(Line::from("third")).unwrap();

        assert_eq!(rx.pop().await.unwrap().as_str(), "first");
        assert_eq!(rx.pop().await.unwrap().as_str(), "second");
        assert_eq!(rx.pop().await.unwrap().as_str(), "third");
    }

    #[tokio::test]
    async fn test_push_from_plain_thread() {
        let (tx, mut rx) = line_channel();

        let producer = std::thread::spawn(move || {
            for i in 0..100 {
                tx.push(Line::from(format!("line {}", i))).unwrap();
            }
        });

        for i in 0..100 {
            assert_eq!(rx.pop().await.unwrap().as_str(), format!("line {}", i));
        }

        producer.join().unwrap();
    }

    #[tokio::test]
    async fn test_pop_waits_for_producer() {
        let (tx, mut rx) = line_channel();

        // Nothing queued yet: pop must suspend, not return
        let pending = tokio::time::timeout(Duration::from_millis(20), rx.pop()).await;
        assert!(pending.is_err());

        tx.push(Line::from("late")).unwrap();
        assert_eq!(rx.pop().await.unwrap().as_str(), "late");
    }

    #[tokio::test]
    async fn test_closed_queue() {
        let (tx, mut rx) = line_channel();

        tx.push(Line::from("last")).unwrap();
        drop(tx);

        // Queued lines drain before the close is observed
        assert_eq!(rx.pop().await.unwrap().as_str(), "last");
        assert!(rx.pop().await.is_none());
    }

    #[tokio::test]
    async fn test_push_after_consumer_dropped() {
        let (tx, rx) = line_channel();
        drop(rx);

        assert_eq!(tx.push(Line::from("lost")), Err(QueueClosed));
    }
}
