use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::btree_map;
use std::collections::BTreeMap;
use strum::{Display, EnumString};

/// Signed flow series for one canonical edge, in MW.
///
/// Keys are UTC instants. A positive value is flow along the edge's declared
/// direction, a negative value is flow against it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlowSeries {
    points: BTreeMap<DateTime<Utc>, f64>,
}

impl FlowSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, at: &DateTime<Utc>) -> Option<f64> {
        self.points.get(at).copied()
    }

    /// Points in ascending time order
    pub fn iter(&self) -> impl Iterator<Item = (&DateTime<Utc>, &f64)> {
        self.points.iter()
    }

    pub fn timestamps(&self) -> btree_map::Keys<'_, DateTime<Utc>, f64> {
        self.points.keys()
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.points.keys().next().copied()
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.points.keys().next_back().copied()
    }

    /// Merge points into the series, replacing values on colliding keys.
    ///
    /// Values are multiplied by `orientation.sign()` before insertion.
    /// Returns the number of keys that already existed.
    pub fn merge<'a, I>(&mut self, points: I, orientation: Orientation) -> usize
    where
        I: IntoIterator<Item = (&'a DateTime<Utc>, &'a f64)>,
    {
        let sign = orientation.sign();
        let mut overwritten = 0;
        for (ts, value) in points {
            if self.points.insert(*ts, value * sign).is_some() {
                overwritten += 1;
            }
        }
        overwritten
    }

    /// Keys where merging `points` would replace an existing, different value
    pub fn conflicts<'a, I>(&self, points: I, orientation: Orientation) -> Vec<DateTime<Utc>>
    where
        I: IntoIterator<Item = (&'a DateTime<Utc>, &'a f64)>,
    {
        let sign = orientation.sign();
        points
            .into_iter()
            .filter(|(ts, value)| match self.points.get(*ts) {
                Some(existing) => *existing != **value * sign,
                None => false,
            })
            .map(|(ts, _)| *ts)
            .collect()
    }
}

impl FromIterator<(DateTime<Utc>, f64)> for FlowSeries {
    fn from_iter<T: IntoIterator<Item = (DateTime<Utc>, f64)>>(iter: T) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

/// How a file's sender/recipient pair lines up with its canonical edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Orientation {
    /// File direction equals the edge's declared direction
    AsDeclared,
    /// File direction is the reverse; values get negated
    Reversed,
}

impl Orientation {
    pub fn sign(self) -> f64 {
        match self {
            Orientation::AsDeclared => 1.0,
            Orientation::Reversed => -1.0,
        }
    }
}

/// Result of looking up an edge at a single instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum FlowValue {
    Data(f64),
    NoData,
}

impl FlowValue {
    pub fn as_option(self) -> Option<f64> {
        match self {
            FlowValue::Data(v) => Some(v),
            FlowValue::NoData => None,
        }
    }

    pub fn is_data(&self) -> bool {
        matches!(self, FlowValue::Data(_))
    }

    pub fn negate(self) -> Self {
        match self {
            FlowValue::Data(v) => FlowValue::Data(-v),
            FlowValue::NoData => FlowValue::NoData,
        }
    }
}

impl From<Option<f64>> for FlowValue {
    fn from(v: Option<f64>) -> Self {
        v.map_or(FlowValue::NoData, FlowValue::Data)
    }
}

/// Physical direction of a flow value relative to its canonical edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum FlowDirection {
    Forward,
    Reverse,
    Idle,
}

impl FlowDirection {
    pub fn of(value_mw: f64) -> Self {
        if value_mw > 0.0 {
            FlowDirection::Forward
        } else if value_mw < 0.0 {
            FlowDirection::Reverse
        } else {
            FlowDirection::Idle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 7, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_merge_reversed_negates() {
        let incoming: BTreeMap<_, _> = [(t(10), 500.0)].into_iter().collect();
        let mut series = FlowSeries::new();
        series.merge(&incoming, Orientation::Reversed);
        assert_eq!(series.get(&t(10)), Some(-500.0));
    }

    #[test]
    fn test_merge_last_write_wins() {
        let mut series: FlowSeries = [(t(10), 100.0), (t(11), 120.0)].into_iter().collect();
        let incoming: BTreeMap<_, _> = [(t(11), 80.0), (t(12), 90.0)].into_iter().collect();

        let overwritten = series.merge(&incoming, Orientation::AsDeclared);

        assert_eq!(overwritten, 1);
        assert_eq!(series.get(&t(11)), Some(80.0));
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn test_conflicts_ignore_equal_values() {
        let series: FlowSeries = [(t(10), -50.0), (t(11), 30.0)].into_iter().collect();
        let incoming: BTreeMap<_, _> = [(t(10), 50.0), (t(11), 40.0)].into_iter().collect();

        // 50 reversed is -50: redundant, not a conflict
        let conflicts = series.conflicts(&incoming, Orientation::Reversed);
        assert_eq!(conflicts, vec![t(11)]);
    }

    #[test]
    fn test_series_bounds() {
        let series: FlowSeries = [(t(12), 1.0), (t(9), 2.0)].into_iter().collect();
        assert_eq!(series.first_timestamp(), Some(t(9)));
        assert_eq!(series.last_timestamp(), Some(t(12)));
        assert!(FlowSeries::new().first_timestamp().is_none());
    }

    #[test]
    fn test_flow_direction() {
        assert_eq!(FlowDirection::of(12.5), FlowDirection::Forward);
        assert_eq!(FlowDirection::of(-0.1), FlowDirection::Reverse);
        assert_eq!(FlowDirection::of(0.0), FlowDirection::Idle);
        assert_eq!(FlowDirection::Reverse.to_string(), "reverse");
    }

    #[test]
    fn test_flow_value_conversions() {
        assert_eq!(FlowValue::from(Some(3.0)).negate(), FlowValue::Data(-3.0));
        assert_eq!(FlowValue::from(None), FlowValue::NoData);
        assert_eq!(FlowValue::NoData.as_option(), None);
    }
}
