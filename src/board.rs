//! Display elements written by the supervisor and the sink.
//!
//! A [`Board`] holds only the elements that are mounted. Writes to an
//! element that is not mounted are silently dropped, so the core runs
//! unchanged whether the full dashboard or a single widget is on screen.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::data::{BoundedSeries, Tone};

/// Stable identifiers of the display elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementId {
    #[serde(rename = "total-value")]
    TotalValue,
    #[serde(rename = "change-24h")]
    Change24h,
    #[serde(rename = "last-updated")]
    LastUpdated,
    #[serde(rename = "connected")]
    Connected,
    #[serde(rename = "disconnected")]
    Disconnected,
}

impl ElementId {
    pub const ALL: [ElementId; 5] = [
        ElementId::TotalValue,
        ElementId::Change24h,
        ElementId::LastUpdated,
        ElementId::Connected,
        ElementId::Disconnected,
    ];

    /// The identifier used in configuration files.
    pub fn key(&self) -> &'static str {
        match self {
            ElementId::TotalValue => "total-value",
            ElementId::Change24h => "change-24h",
            ElementId::LastUpdated => "last-updated",
            ElementId::Connected => "connected",
            ElementId::Disconnected => "disconnected",
        }
    }
}

/// Mutable state of one mounted element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub text: String,
    pub tone: Option<Tone>,
    pub visible: bool,
    /// Raw timestamp attached for later relative-time rendering.
    pub timestamp: Option<String>,
}

/// Whether a chart redraw should animate.
///
/// Streaming updates always redraw with `Disabled`. `Enabled` is kept for
/// callers that redraw once, such as an embedder loading a saved series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Animation {
    Disabled,
    Enabled,
}

/// Render-ready copy of the series for the chart widget.
#[derive(Debug, Clone)]
pub struct ChartPanel {
    data: Vec<(f64, f64)>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    redraws: u64,
    last_animation: Option<Animation>,
}

impl Default for ChartPanel {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            x_bounds: [0.0, 1.0],
            y_bounds: [0.0, 1.0],
            redraws: 0,
            last_animation: None,
        }
    }
}

impl ChartPanel {
    /// Rebuild the chart data from the series.
    ///
    /// X values are seconds relative to the oldest point so the axis stays
    /// readable; Y bounds get a small margin around the value range.
    pub fn redraw(&mut self, series: &BoundedSeries, animation: Animation) {
        self.redraws += 1;
        self.last_animation = Some(animation);

        let Some(origin) = series.first().map(|p| p.timestamp()) else {
            self.data.clear();
            self.x_bounds = [0.0, 1.0];
            self.y_bounds = [0.0, 1.0];
            return;
        };

        self.data = series
            .iter()
            .map(|p| {
                let x = (p.timestamp() - origin).num_milliseconds() as f64 / 1000.0;
                (x, p.value())
            })
            .collect();

        let x_max = self.data.last().map(|(x, _)| *x).unwrap_or(0.0);
        self.x_bounds = [0.0, x_max.max(1.0)];

        let (lo, hi) = series.value_range().unwrap_or((0.0, 1.0));
        let margin = if hi > lo {
            (hi - lo) * 0.05
        } else {
            (lo.abs() * 0.01).max(1.0)
        };
        self.y_bounds = [lo - margin, hi + margin];
    }

    pub fn data(&self) -> &[(f64, f64)] {
        &self.data
    }

    pub fn x_bounds(&self) -> [f64; 2] {
        self.x_bounds
    }

    pub fn y_bounds(&self) -> [f64; 2] {
        self.y_bounds
    }

    /// Number of redraws requested so far.
    pub fn redraw_count(&self) -> u64 {
        self.redraws
    }

    pub fn last_animation(&self) -> Option<Animation> {
        self.last_animation
    }
}

/// The set of mounted display elements.
#[derive(Debug, Clone, Default)]
pub struct Board {
    elements: HashMap<ElementId, Element>,
    chart: Option<ChartPanel>,
}

impl Board {
    /// A board with nothing mounted.
    pub fn new() -> Self {
        Self::default()
    }

    /// A board with every element and the chart mounted.
    pub fn full() -> Self {
        Self::with_elements(ElementId::ALL.iter().copied(), true)
    }

    /// A board with the given elements, and the chart if `chart` is set.
    pub fn with_elements<I>(ids: I, chart: bool) -> Self
    where
        I: IntoIterator<Item = ElementId>,
    {
        let mut board = Self::new();
        for id in ids {
            board.mount(id);
        }
        if chart {
            board.mount_chart();
        }
        board
    }

    pub fn mount(&mut self, id: ElementId) {
        self.elements.entry(id).or_default();
    }

    pub fn mount_chart(&mut self) {
        self.chart.get_or_insert_with(ChartPanel::default);
    }

    pub fn is_mounted(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.get_mut(&id)
    }

    /// Text of an element, if mounted.
    pub fn text(&self, id: ElementId) -> Option<&str> {
        self.element(id).map(|e| e.text.as_str())
    }

    /// Whether an element is mounted and visible.
    pub fn is_visible(&self, id: ElementId) -> bool {
        self.element(id).is_some_and(|e| e.visible)
    }

    pub fn show(&mut self, id: ElementId) {
        if let Some(element) = self.element_mut(id) {
            element.visible = true;
        }
    }

    pub fn hide(&mut self, id: ElementId) {
        if let Some(element) = self.element_mut(id) {
            element.visible = false;
        }
    }

    pub fn set_text(&mut self, id: ElementId, text: impl Into<String>) {
        if let Some(element) = self.element_mut(id) {
            element.text = text.into();
        }
    }

    pub fn set_tone(&mut self, id: ElementId, tone: Option<Tone>) {
        if let Some(element) = self.element_mut(id) {
            element.tone = tone;
        }
    }

    pub fn set_timestamp(&mut self, id: ElementId, timestamp: impl Into<String>) {
        if let Some(element) = self.element_mut(id) {
            element.timestamp = Some(timestamp.into());
        }
    }

    pub fn chart(&self) -> Option<&ChartPanel> {
        self.chart.as_ref()
    }

    pub fn chart_mut(&mut self) -> Option<&mut ChartPanel> {
        self.chart.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SeriesPoint;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_writes_to_unmounted_elements_are_dropped() {
        let mut board = Board::with_elements([ElementId::TotalValue], false);

        board.set_text(ElementId::Change24h, "+1.00%");
        board.show(ElementId::Connected);
        board.set_timestamp(ElementId::LastUpdated, "2024-05-01T12:00:00Z");

        assert!(board.element(ElementId::Change24h).is_none());
        assert!(!board.is_visible(ElementId::Connected));
        assert!(board.chart().is_none());
    }

    #[test]
    fn test_show_hide_is_idempotent() {
        let mut board = Board::full();
        board.show(ElementId::Connected);
        board.show(ElementId::Connected);
        assert!(board.is_visible(ElementId::Connected));
        board.hide(ElementId::Connected);
        board.hide(ElementId::Connected);
        assert!(!board.is_visible(ElementId::Connected));
    }

    #[test]
    fn test_element_keys_match_serde() {
        for id in ElementId::ALL {
            let json = serde_json::to_string(&id).unwrap();
            assert_eq!(json, format!("\"{}\"", id.key()));
        }
    }

    #[test]
    fn test_chart_redraw_uses_relative_seconds() {
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let mut series = BoundedSeries::new(10);
        series.push(SeriesPoint::new(base, 100.0));
        series.push(SeriesPoint::new(base + Duration::milliseconds(2500), 200.0));

        let mut chart = ChartPanel::default();
        chart.redraw(&series, Animation::Disabled);

        assert_eq!(chart.data(), &[(0.0, 100.0), (2.5, 200.0)]);
        assert_eq!(chart.x_bounds(), [0.0, 2.5]);
        let [lo, hi] = chart.y_bounds();
        assert!((lo - 95.0).abs() < 1e-9);
        assert!((hi - 205.0).abs() < 1e-9);
        assert_eq!(chart.redraw_count(), 1);
        assert_eq!(chart.last_animation(), Some(Animation::Disabled));
    }

    #[test]
    fn test_chart_redraw_flat_series_has_height() {
        let mut series = BoundedSeries::new(10);
        series.push(SeriesPoint::new(Utc::now(), 50.0));

        let mut chart = ChartPanel::default();
        chart.redraw(&series, Animation::Disabled);

        let [lo, hi] = chart.y_bounds();
        assert!(hi > lo);
    }

    #[test]
    fn test_chart_records_requested_animation() {
        let mut series = BoundedSeries::new(10);
        series.push(SeriesPoint::new(Utc::now(), 50.0));

        let mut chart = ChartPanel::default();
        chart.redraw(&series, Animation::Enabled);
        assert_eq!(chart.last_animation(), Some(Animation::Enabled));

        chart.redraw(&series, Animation::Disabled);
        assert_eq!(chart.last_animation(), Some(Animation::Disabled));
        assert_eq!(chart.redraw_count(), 2);
    }
}
