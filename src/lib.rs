//! # portfolio-pulse
//!
//! A terminal dashboard and library for following a live portfolio value
//! pushed over server-sent events.
//!
//! The core is two components: a [`ConnectionSupervisor`] that tracks
//! whether the stream is up, retries with capped exponential backoff and
//! keeps the "last updated" label fresh, and a [`BoundedSeriesSink`] that
//! keeps the last 100 values for charting and derives the summary cards.
//! Both write to a [`Board`] of display elements that the TUI renders.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                          Application                           │
//! │  ┌───────────┐  events  ┌─────────┐  set_connected  ┌────────┐ │
//! │  │ transport │─────────▶│   app   │────────────────▶│superv. │ │
//! │  │  (input)  │◀─────────│         │  add_data_point │        │ │
//! │  └───────────┘  reopen  └────┬────┘───────┐         └───┬────┘ │
//! │                              │            ▼             │      │
//! │                              │        ┌───────┐         │      │
//! │                              │        │ sink  │         │      │
//! │                              │        └───┬───┘         │      │
//! │                              ▼            ▼             ▼      │
//! │                          ┌──────┐     ┌───────────────────┐    │
//! │                          │  ui  │◀────│       board       │    │
//! │                          └──────┘     └───────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: Transport abstraction ([`Transport`] trait) with an
//!   HTTP event-stream implementation and a channel-based one
//! - **[`supervisor`]**: Connection state, reconnect backoff, heartbeat
//! - **[`sink`]**: Bounded series and summary derivation
//! - **[`board`]**: Display elements shared by the core and the UI
//! - **[`schedule`]**: Cancellable timers driven by a [`Clock`]
//! - **[`data`]**: Payload decoding, series storage and display formatting
//! - **[`ui`]**: Terminal rendering using ratatui
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! portfolio-pulse --url http://127.0.0.1:8000/api/portfolio/stream
//!
//! # Without a terminal UI, logging to stderr
//! portfolio-pulse --headless
//! ```
//!
//! ### As a library with channel source
//!
//! ```
//! use std::sync::Arc;
//! use portfolio_pulse::{App, ChannelSource, ElementId, Settings, SystemClock, TransportEvent};
//!
//! let (tx, source) = ChannelSource::create("embedded");
//! let mut app = App::new(Box::new(source), Arc::new(SystemClock), &Settings::default());
//!
//! tx.send(TransportEvent::Open);
//! tx.send(TransportEvent::Message(
//!     r#"{"timestamp":"2024-05-01T12:00:00Z","total_value_usd":1234.5}"#.to_string(),
//! ));
//! app.pump();
//!
//! assert_eq!(app.board.text(ElementId::TotalValue), Some("1,234.50"));
//! ```
//!
//! ### As a library with the event-stream source
//!
//! ```no_run
//! use std::sync::Arc;
//! use portfolio_pulse::{App, EventStreamSource, Settings, SystemClock};
//!
//! # tokio_test::block_on(async {
//! let settings = Settings::default();
//! let source = EventStreamSource::spawn(&settings.stream.url, settings.stream.options()).unwrap();
//! let app = App::new(Box::new(source), Arc::new(SystemClock), &settings);
//! # });
//! ```

pub mod app;
pub mod board;
pub mod config;
pub mod data;
pub mod events;
pub mod logging;
pub mod schedule;
pub mod sink;
pub mod source;
pub mod supervisor;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use board::{Animation, Board, ElementId};
pub use config::Settings;
pub use data::{BoundedSeries, PortfolioUpdate, SeriesPoint, ServerMessage, SummarySnapshot, Tone};
pub use schedule::{Clock, ManualClock, Scheduler, SystemClock, TimerHandle};
pub use sink::BoundedSeriesSink;
pub use source::{
    ChannelSender, ChannelSource, EventStreamSource, Reopen, SourceError, StreamOptions,
    Transport, TransportEvent,
};
pub use supervisor::{
    ConnectionState, ConnectionSupervisor, RetryOutcome, RetryPhase, RetryPolicy, RetryState,
    SupervisorSettings,
};
