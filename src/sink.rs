//! Bounded series sink.
//!
//! Turns accepted updates into chart points under a fixed memory ceiling and
//! keeps the summary cards in step with the latest update.

use tracing::debug;

use crate::board::{Animation, Board, ElementId};
use crate::data::{BoundedSeries, PortfolioUpdate, SeriesPoint, SummarySnapshot, SERIES_CAPACITY};

/// Owns the bounded series and the derived summary.
#[derive(Debug, Clone)]
pub struct BoundedSeriesSink {
    series: BoundedSeries,
    summary: Option<SummarySnapshot>,
    accepted: u64,
}

impl Default for BoundedSeriesSink {
    fn default() -> Self {
        Self::new(SERIES_CAPACITY)
    }
}

impl BoundedSeriesSink {
    pub fn new(capacity: usize) -> Self {
        Self {
            series: BoundedSeries::new(capacity),
            summary: None,
            accepted: 0,
        }
    }

    pub fn series(&self) -> &BoundedSeries {
        &self.series
    }

    /// Summary of the most recent update, if any was accepted.
    pub fn summary(&self) -> Option<&SummarySnapshot> {
        self.summary.as_ref()
    }

    /// Total updates accepted, evicted ones included.
    pub fn accepted_count(&self) -> u64 {
        self.accepted
    }

    /// Append an update and refresh the chart and summary elements.
    ///
    /// Returns the point evicted to stay within capacity, if any.
    pub fn add_data_point(&mut self, update: &PortfolioUpdate, board: &mut Board) -> Option<SeriesPoint> {
        let evicted = self
            .series
            .push(SeriesPoint::new(update.at(), update.total_value_usd()));
        self.accepted += 1;

        if let Some(point) = &evicted {
            debug!(
                evicted_at = %point.timestamp(),
                len = self.series.len(),
                "Series at capacity, dropped oldest point"
            );
        }

        // Real-time feeds redraw without transitions
        if let Some(chart) = board.chart_mut() {
            chart.redraw(&self.series, Animation::Disabled);
        }

        let summary = SummarySnapshot::from_update(update);
        board.set_text(ElementId::TotalValue, summary.value_text());
        if let Some(change) = summary.change_text() {
            board.set_text(ElementId::Change24h, change);
            board.set_tone(ElementId::Change24h, summary.change_tone());
        }
        board.set_timestamp(ElementId::LastUpdated, summary.last_update_timestamp.clone());
        self.summary = Some(summary);

        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Tone;
    use chrono::{Duration, TimeZone, Utc};

    fn update_at(secs: i64, value: f64, change: Option<f64>) -> PortfolioUpdate {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + Duration::seconds(secs);
        PortfolioUpdate::new(&at.to_rfc3339(), value, change).unwrap()
    }

    #[test]
    fn test_summary_for_positive_change() {
        let mut sink = BoundedSeriesSink::default();
        let mut board = Board::full();
        let update = PortfolioUpdate::new("2024-05-01T12:00:00+00:00", 12345.67, Some(5.43)).unwrap();

        sink.add_data_point(&update, &mut board);

        assert_eq!(board.text(ElementId::TotalValue), Some("12,345.67"));
        assert_eq!(board.text(ElementId::Change24h), Some("+5.43%"));
        assert_eq!(
            board.element(ElementId::Change24h).unwrap().tone,
            Some(Tone::Positive)
        );
        assert_eq!(
            board.element(ElementId::LastUpdated).unwrap().timestamp.as_deref(),
            Some("2024-05-01T12:00:00+00:00")
        );
    }

    #[test]
    fn test_summary_for_negative_change() {
        let mut sink = BoundedSeriesSink::default();
        let mut board = Board::full();

        sink.add_data_point(&update_at(0, 900.0, Some(-3.21)), &mut board);

        assert_eq!(board.text(ElementId::Change24h), Some("-3.21%"));
        assert_eq!(
            board.element(ElementId::Change24h).unwrap().tone,
            Some(Tone::Negative)
        );
    }

    #[test]
    fn test_missing_change_leaves_previous_change() {
        let mut sink = BoundedSeriesSink::default();
        let mut board = Board::full();

        sink.add_data_point(&update_at(0, 100.0, Some(1.0)), &mut board);
        sink.add_data_point(&update_at(1, 101.0, None), &mut board);

        assert_eq!(board.text(ElementId::TotalValue), Some("101.00"));
        assert_eq!(board.text(ElementId::Change24h), Some("+1.00%"));
        assert_eq!(sink.summary().unwrap().change_percent, None);
    }

    #[test]
    fn test_evicts_oldest_after_capacity() {
        let mut sink = BoundedSeriesSink::default();
        let mut board = Board::full();

        for i in 0..100 {
            assert!(sink.add_data_point(&update_at(i, i as f64, None), &mut board).is_none());
        }
        let evicted = sink.add_data_point(&update_at(100, 100.0, None), &mut board);

        assert_eq!(evicted.map(|p| p.value()), Some(0.0));
        assert_eq!(sink.series().len(), 100);
        assert_eq!(sink.series().first().unwrap().value(), 1.0);
        assert_eq!(sink.series().last().unwrap().value(), 100.0);
        assert_eq!(sink.accepted_count(), 101);
    }

    #[test]
    fn test_length_never_exceeds_capacity() {
        let mut sink = BoundedSeriesSink::new(10);
        let mut board = Board::new();
        for i in 0..250 {
            sink.add_data_point(&update_at(i, 1.0, None), &mut board);
            assert!(sink.series().len() <= 10);
        }
    }

    #[test]
    fn test_chart_redrawn_without_animation() {
        let mut sink = BoundedSeriesSink::default();
        let mut board = Board::full();

        sink.add_data_point(&update_at(0, 10.0, None), &mut board);
        sink.add_data_point(&update_at(30, 20.0, None), &mut board);

        let chart = board.chart().unwrap();
        assert_eq!(chart.redraw_count(), 2);
        assert_eq!(chart.last_animation(), Some(Animation::Disabled));
        assert_eq!(chart.data(), &[(0.0, 10.0), (30.0, 20.0)]);
    }

    #[test]
    fn test_unmounted_elements_are_skipped() {
        let mut sink = BoundedSeriesSink::default();
        let mut board = Board::with_elements([ElementId::TotalValue], false);

        sink.add_data_point(&update_at(0, 5.0, Some(2.0)), &mut board);

        assert_eq!(board.text(ElementId::TotalValue), Some("5.00"));
        assert!(board.element(ElementId::Change24h).is_none());
        assert!(board.chart().is_none());
        assert_eq!(sink.series().len(), 1);
    }
}
