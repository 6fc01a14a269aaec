//! Application state and event dispatch.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::board::Board;
use crate::config::Settings;
use crate::data::{ServerMessage, UpdateError};
use crate::schedule::Clock;
use crate::sink::BoundedSeriesSink;
use crate::source::{Transport, TransportEvent};
use crate::supervisor::{ConnectionSupervisor, RetryOutcome};
use crate::ui::Theme;

/// How long a status message stays on screen.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

/// Main application state.
///
/// Owns the board, the supervisor, the sink and the transport, and routes
/// transport events between them.
pub struct App {
    pub running: bool,
    pub show_help: bool,

    pub board: Board,
    pub supervisor: ConnectionSupervisor,
    pub sink: BoundedSeriesSink,
    source: Box<dyn Transport>,
    clock: Arc<dyn Clock>,

    /// Last error notice sent by the server, cleared by the next update.
    pub server_error: Option<String>,
    /// Payloads rejected at the boundary.
    pub rejected: u64,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create a new App reading from `source`.
    pub fn new(source: Box<dyn Transport>, clock: Arc<dyn Clock>, settings: &Settings) -> Self {
        let mut board = Board::with_elements(
            settings.board.elements.iter().copied(),
            settings.board.chart,
        );
        let supervisor =
            ConnectionSupervisor::new(clock.clone(), source.reopen_handle(), settings.supervisor());
        supervisor.apply_indicators(&mut board);

        Self {
            running: true,
            show_help: false,
            board,
            supervisor,
            sink: BoundedSeriesSink::new(settings.series.capacity),
            source,
            clock,
            server_error: None,
            rejected: 0,
            theme: Theme::dark(),
            status_message: None,
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Returns a description of the transport.
    pub fn source_description(&self) -> &str {
        self.source.description()
    }

    /// Handle every pending transport event, then fire due timers.
    ///
    /// Returns the number of transport events handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.source.poll() {
            self.handle_transport_event(event);
            handled += 1;
        }
        self.tick();
        handled
    }

    /// Route one transport event.
    pub fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Open => {
                self.supervisor.set_connected(true, &mut self.board);
            }
            TransportEvent::Closed => self.disconnected(),
            TransportEvent::Error(message) => {
                warn!(source = self.source.description(), error = %message, "Transport error");
                self.disconnected();
            }
            TransportEvent::Message(data) => {
                if let Err(err) = self.accept_message(&data) {
                    self.rejected += 1;
                    warn!(error = %err, rejected = self.rejected, "Rejected server message");
                }
            }
        }
    }

    fn disconnected(&mut self) {
        if let Some(RetryOutcome::Exhausted) = self.supervisor.set_connected(false, &mut self.board)
        {
            self.set_status_message("Reconnect attempts exhausted, press r to retry".to_string());
        }
    }

    /// Decode one message and apply it.
    ///
    /// Rejected messages leave the series and summary untouched.
    pub fn accept_message(&mut self, data: &str) -> Result<(), UpdateError> {
        match ServerMessage::parse(data)? {
            ServerMessage::Update(update) => {
                self.sink.add_data_point(&update, &mut self.board);
                self.supervisor.update_relative_times(&mut self.board);
                self.server_error = None;
                info!(
                    timestamp = update.timestamp(),
                    total_value_usd = update.total_value_usd(),
                    change_24h = ?update.change_percent(),
                    points = self.sink.series().len(),
                    "Portfolio update"
                );
            }
            ServerMessage::Error { message, timestamp } => {
                warn!(message = %message, timestamp = ?timestamp, "Server reported an error");
                self.server_error = Some(message);
            }
        }
        Ok(())
    }

    /// Fire due timers.
    pub fn tick(&mut self) -> usize {
        self.supervisor.poll_timers(&mut self.board)
    }

    /// Re-open the stream now.
    pub fn reconnect_now(&mut self) {
        if self.supervisor.is_connected() {
            debug!("Manual reconnect ignored while connected");
            self.set_status_message("Already connected".to_string());
            return;
        }
        self.supervisor.request_manual_reconnect();
        self.set_status_message("Reconnecting...".to_string());
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, self.clock.now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        match &self.status_message {
            Some((msg, at)) if self.clock.now().duration_since(*at) < STATUS_MESSAGE_TTL => {
                Some(msg)
            }
            _ => None,
        }
    }

    /// Write the current series and summary as JSON.
    pub fn export_series(&self, path: &Path) -> Result<()> {
        if self.sink.series().is_empty() {
            anyhow::bail!("No data to export");
        }

        let points: Vec<_> = self.sink.series().iter().collect();
        let export = serde_json::json!({
            "source": self.source.description(),
            "exported_at": self.clock.wall().to_rfc3339(),
            "connected": self.supervisor.is_connected(),
            "accepted": self.sink.accepted_count(),
            "summary": self.sink.summary(),
            "points": points,
        });

        std::fs::write(path, serde_json::to_string_pretty(&export)?)?;
        info!(path = %path.display(), points = points.len(), "Exported series");
        Ok(())
    }

    /// Toggle help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Stop timers and leave the main loop.
    pub fn quit(&mut self) {
        self.supervisor.shutdown();
        self.running = false;
    }
}
