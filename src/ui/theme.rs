//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::data::Tone;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    /// Color for gains and the live indicator.
    pub positive: Color,
    /// Color for losses and the offline indicator.
    pub negative: Color,
    /// Color for pending reconnects and notices.
    pub warning: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Color of the chart line.
    pub series: Color,
    /// Style for card titles and headings.
    pub header: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            positive: Color::Green,
            negative: Color::Red,
            warning: Color::Yellow,
            border: Color::Gray,
            series: Color::Cyan,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            positive: Color::Green,
            negative: Color::Red,
            warning: Color::Magenta,
            border: Color::DarkGray,
            series: Color::Blue,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Style for a change figure
    pub fn tone_style(&self, tone: Option<Tone>) -> Style {
        match tone {
            Some(Tone::Positive) => Style::default().fg(self.positive).add_modifier(Modifier::BOLD),
            Some(Tone::Negative) => Style::default().fg(self.negative).add_modifier(Modifier::BOLD),
            None => Style::default(),
        }
    }

    /// Style for the connection indicator
    pub fn connection_style(&self, connected: bool) -> Style {
        if connected {
            Style::default().fg(self.positive)
        } else {
            Style::default().fg(self.negative).add_modifier(Modifier::BOLD)
        }
    }
}
