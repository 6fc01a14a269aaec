//! Common UI components.
//!
//! This module contains the header bar, status bar, and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::App;
use crate::board::ElementId;
use crate::supervisor::RetryPhase;

/// Render the header bar with the connection indicator and retry state.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let board = &app.board;
    // Indicators are board elements; fall back to the supervisor when
    // neither is mounted.
    let connected = if board.is_mounted(ElementId::Connected)
        || board.is_mounted(ElementId::Disconnected)
    {
        board.is_visible(ElementId::Connected)
    } else {
        app.supervisor.is_connected()
    };

    let (label, style) = if connected {
        ("● LIVE", app.theme.connection_style(true))
    } else {
        ("● OFFLINE", app.theme.connection_style(false))
    };

    let mut spans = vec![
        Span::styled(format!(" {} ", label), style),
        Span::styled("PORTFOLIO PULSE ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::raw(app.source_description().to_string()),
    ];

    if let Some(retry) = retry_text(app) {
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled(retry, Style::default().fg(app.theme.warning)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Describe where the reconnect loop is, if anywhere.
fn retry_text(app: &App) -> Option<String> {
    let supervisor = &app.supervisor;
    if supervisor.is_connected() {
        return None;
    }
    let retry = supervisor.retry();
    match supervisor.phase() {
        RetryPhase::Waiting { .. } => {
            let secs = supervisor
                .next_reconnect_in()
                .map(|d| d.as_secs_f64())
                .unwrap_or_default();
            Some(format!(
                "retry {}/{} in {:.1}s",
                retry.attempts() + 1,
                retry.max_attempts(),
                secs
            ))
        }
        RetryPhase::AttemptInFlight => Some(format!(
            "reconnecting ({}/{})",
            retry.attempts(),
            retry.max_attempts()
        )),
        RetryPhase::Idle if retry.is_exhausted() => {
            Some("retries exhausted, press r".to_string())
        }
        RetryPhase::Idle => None,
    }
}

/// Render the status bar at the bottom.
///
/// Shows temporary status messages first, then server errors, then a
/// summary of the series and the available controls.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    if let Some(ref err) = app.server_error {
        let paragraph = Paragraph::new(format!(" Server error: {} | r:reconnect q:quit", err))
            .style(Style::default().fg(app.theme.negative));
        frame.render_widget(paragraph, area);
        return;
    }

    let series = app.sink.series();
    let mut status = format!(
        " {}/{} points | {} received",
        series.len(),
        series.capacity(),
        app.sink.accepted_count()
    );
    if app.rejected > 0 {
        status.push_str(&format!(" | {} rejected", app.rejected));
    }
    status.push_str(" | r:reconnect e:export ?:help q:quit");

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the dashboard.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        Line::from("  r         Reconnect now"),
        Line::from("  e         Export series to JSON"),
        Line::from("  ?         Toggle help"),
        Line::from("  q / Esc   Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_width = 40u16.min(area.width.saturating_sub(4));
    let help_height = 10u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
