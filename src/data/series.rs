//! Fixed-capacity time series for the live chart.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Default number of points kept for the chart.
pub const SERIES_CAPACITY: usize = 100;

/// One charted value. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    timestamp: DateTime<Utc>,
    value: f64,
}

impl SeriesPoint {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

/// Insertion-ordered points with FIFO eviction.
///
/// Holds at most `capacity` points; pushing onto a full series drops the
/// oldest one.
#[derive(Debug, Clone)]
pub struct BoundedSeries {
    points: VecDeque<SeriesPoint>,
    capacity: usize,
}

impl Default for BoundedSeries {
    fn default() -> Self {
        Self::new(SERIES_CAPACITY)
    }
}

impl BoundedSeries {
    /// Create an empty series. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append a point, returning the evicted oldest point if the series
    /// was already full.
    pub fn push(&mut self, point: SeriesPoint) -> Option<SeriesPoint> {
        self.points.push_back(point);
        if self.points.len() > self.capacity {
            self.points.pop_front()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest point still held.
    pub fn first(&self) -> Option<&SeriesPoint> {
        self.points.front()
    }

    /// Most recent point.
    pub fn last(&self) -> Option<&SeriesPoint> {
        self.points.back()
    }

    pub fn get(&self, index: usize) -> Option<&SeriesPoint> {
        self.points.get(index)
    }

    /// Points from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &SeriesPoint> + '_ {
        self.points.iter()
    }

    /// Smallest and largest value, if any points are held.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let mut values = self.points.iter().map(|p| p.value);
        let first = values.next()?;
        Some(values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn point(n: i64) -> SeriesPoint {
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        SeriesPoint::new(base + Duration::seconds(n), n as f64)
    }

    #[test]
    fn test_push_below_capacity_keeps_everything() {
        let mut series = BoundedSeries::new(3);
        assert!(series.push(point(1)).is_none());
        assert!(series.push(point(2)).is_none());
        assert_eq!(series.len(), 2);
        assert_eq!(series.first(), Some(&point(1)));
        assert_eq!(series.last(), Some(&point(2)));
    }

    #[test]
    fn test_evicts_oldest_first() {
        let mut series = BoundedSeries::new(3);
        for n in 1..=3 {
            series.push(point(n));
        }

        assert_eq!(series.push(point(4)), Some(point(1)));
        let values: Vec<f64> = series.iter().map(|p| p.value()).collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_default_capacity_bound() {
        let mut series = BoundedSeries::default();
        for n in 1..=250 {
            series.push(point(n));
            assert!(series.len() <= SERIES_CAPACITY);
        }
        assert_eq!(series.len(), SERIES_CAPACITY);
        assert_eq!(series.first(), Some(&point(151)));
        assert_eq!(series.last(), Some(&point(250)));
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let mut series = BoundedSeries::new(0);
        series.push(point(1));
        series.push(point(2));
        assert_eq!(series.capacity(), 1);
        assert_eq!(series.last(), Some(&point(2)));
    }

    #[test]
    fn test_value_range() {
        let mut series = BoundedSeries::new(10);
        assert!(series.value_range().is_none());
        for n in [5, 2, 9] {
            series.push(point(n));
        }
        assert_eq!(series.value_range(), Some((2.0, 9.0)));
    }
}
