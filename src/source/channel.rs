//! Channel-based transport.
//!
//! Receives transport events pushed by another part of the program. This is
//! useful when the host already owns the connection, and in tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use super::{Reopen, Transport, TransportEvent};

/// A transport fed through an in-memory channel.
///
/// # Example
///
/// ```
/// use portfolio_pulse::{ChannelSource, Transport, TransportEvent};
///
/// let (tx, mut source) = ChannelSource::create("embedded");
/// tx.send(TransportEvent::Message("{}".to_string()));
///
/// assert!(source.poll().is_some());
/// assert_eq!(source.description(), "channel: embedded");
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    receiver: mpsc::UnboundedReceiver<TransportEvent>,
    description: String,
    reopen_requests: Arc<AtomicUsize>,
}

/// Producer side of a [`ChannelSource`].
#[derive(Debug, Clone)]
pub struct ChannelSender {
    sender: mpsc::UnboundedSender<TransportEvent>,
    reopen_requests: Arc<AtomicUsize>,
}

impl ChannelSender {
    /// Push an event. Returns false if the source was dropped.
    pub fn send(&self, event: TransportEvent) -> bool {
        self.sender.send(event).is_ok()
    }

    /// How many times the consumer asked for the stream to be re-opened.
    pub fn reopen_requests(&self) -> usize {
        self.reopen_requests.load(Ordering::SeqCst)
    }
}

/// Reopen handle that records requests for the producer to act on.
#[derive(Debug, Clone)]
pub struct ChannelReopen {
    requests: Arc<AtomicUsize>,
}

impl Reopen for ChannelReopen {
    fn request_reopen(&mut self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }
}

impl ChannelSource {
    /// Create a channel pair.
    ///
    /// Returns (sender, source) where the sender pushes events and observes
    /// reopen requests, and the source is handed to the [`App`](crate::App).
    pub fn create(source_description: &str) -> (ChannelSender, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        let reopen_requests = Arc::new(AtomicUsize::new(0));
        let sender = ChannelSender {
            sender: tx,
            reopen_requests: reopen_requests.clone(),
        };
        let source = Self {
            receiver: rx,
            description: format!("channel: {}", source_description),
            reopen_requests,
        };
        (sender, source)
    }
}

impl Transport for ChannelSource {
    fn poll(&mut self) -> Option<TransportEvent> {
        self.receiver.try_recv().ok()
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn reopen_handle(&self) -> Box<dyn Reopen> {
        Box::new(ChannelReopen {
            requests: self.reopen_requests.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_source_poll_in_order() {
        let (tx, mut source) = ChannelSource::create("test");
        assert!(source.poll().is_none());

        tx.send(TransportEvent::Open);
        tx.send(TransportEvent::Message("a".to_string()));
        tx.send(TransportEvent::Closed);

        assert_eq!(source.poll(), Some(TransportEvent::Open));
        assert_eq!(source.poll(), Some(TransportEvent::Message("a".to_string())));
        assert_eq!(source.poll(), Some(TransportEvent::Closed));
        assert!(source.poll().is_none());
    }

    #[test]
    fn test_reopen_requests_are_counted() {
        let (tx, source) = ChannelSource::create("test");
        let mut handle = source.reopen_handle();

        handle.request_reopen();
        handle.request_reopen();

        assert_eq!(tx.reopen_requests(), 2);
    }

    #[test]
    fn test_send_after_drop() {
        let (tx, source) = ChannelSource::create("test");
        drop(source);
        assert!(!tx.send(TransportEvent::Open));
    }
}
