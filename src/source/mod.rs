//! Transport abstraction for the portfolio event stream.
//!
//! A transport opens the server-push connection, reports lifecycle changes
//! and raw event data as [`TransportEvent`]s, and re-opens the stream when
//! asked through its [`Reopen`] handle. It never retries on its own; the
//! [`ConnectionSupervisor`](crate::ConnectionSupervisor) decides when.

mod channel;
mod error;
pub mod sse;
mod stream;

pub use channel::{ChannelReopen, ChannelSender, ChannelSource};
pub use error::SourceError;
pub use sse::{SseDecoder, SseEvent};
pub use stream::{EventStreamSource, ReopenHandle, StreamOptions};

use std::fmt::Debug;

/// Something the transport observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The stream is open and delivering events.
    Open,
    /// The data field of one event.
    Message(String),
    /// The server ended the stream.
    Closed,
    /// Connecting or reading failed.
    Error(String),
}

/// The capability to ask a transport to re-open its stream.
///
/// Calls never block and report nothing back; the outcome arrives later as
/// a [`TransportEvent`].
pub trait Reopen: Send + Debug {
    fn request_reopen(&mut self);
}

/// Trait for receiving events from a server-push connection.
///
/// # Example
///
/// ```
/// use portfolio_pulse::{ChannelSource, Transport, TransportEvent};
///
/// let (tx, mut source) = ChannelSource::create("test");
/// tx.send(TransportEvent::Open);
/// assert_eq!(source.poll(), Some(TransportEvent::Open));
/// ```
pub trait Transport: Send + Debug {
    /// Take the next pending event without blocking.
    fn poll(&mut self) -> Option<TransportEvent>;

    /// Returns a human-readable description of the transport.
    ///
    /// Used for display in the TUI status bar.
    fn description(&self) -> &str;

    /// A handle the supervisor uses to request a re-open.
    fn reopen_handle(&self) -> Box<dyn Reopen>;
}
