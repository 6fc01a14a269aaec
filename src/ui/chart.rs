//! Line chart of the bounded series.

use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::summary::format_currency;

/// Render the chart panel, or a placeholder while no data has arrived.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(panel) = app.board.chart() else {
        return;
    };

    let series = app.sink.series();
    let block = Block::default()
        .title(Span::styled(
            format!(" Portfolio Value ({}/{}) ", series.len(), series.capacity()),
            app.theme.header,
        ))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    if panel.data().is_empty() {
        let paragraph = Paragraph::new("Waiting for data...")
            .alignment(Alignment::Center)
            .style(Style::default().add_modifier(Modifier::DIM))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let [x_min, x_max] = panel.x_bounds();
    let [y_min, y_max] = panel.y_bounds();

    let x_labels: Vec<String> = match (series.first(), series.last()) {
        (Some(first), Some(last)) => vec![
            first.timestamp().format("%H:%M:%S").to_string(),
            last.timestamp().format("%H:%M:%S").to_string(),
        ],
        _ => vec![format!("{:.0}s", x_min), format!("{:.0}s", x_max)],
    };
    let y_labels = vec![
        format_currency(y_min),
        format_currency((y_min + y_max) / 2.0),
        format_currency(y_max),
    ];

    let dataset = Dataset::default()
        .name("total_value_usd")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(app.theme.series))
        .data(panel.data());

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .style(Style::default().fg(app.theme.border))
                .bounds([x_min, x_max])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(app.theme.border))
                .bounds([y_min, y_max])
                .labels(y_labels),
        );

    frame.render_widget(chart, area);
}
