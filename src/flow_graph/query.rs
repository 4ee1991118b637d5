//! Read-only lookups for consumers of a finished [`FlowGraph`].
//!
//! Nothing here interpolates: a timestamp missing from an edge's series is
//! reported as [`FlowValue::NoData`].

use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::Serialize;

use super::graph::{CanonicalEdge, FlowGraph};
use crate::domain::{FlowDirection, FlowValue, Orientation, Zone};

/// Value of one edge at one instant, as handed to a map layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeFlow {
    pub from: Zone,
    pub to: Zone,
    pub value: FlowValue,
    pub direction: Option<FlowDirection>,
}

impl CanonicalEdge {
    pub fn value_at(&self, at: &DateTime<Utc>) -> FlowValue {
        self.flows.get(at).into()
    }

    pub fn connects(&self, a: &str, b: &str) -> bool {
        (self.from.as_str() == a && self.to.as_str() == b)
            || (self.from.as_str() == b && self.to.as_str() == a)
    }
}

impl FlowGraph {
    /// Canonical edge joining `a` and `b`, whichever way it is declared
    pub fn edge(&self, a: &str, b: &str) -> Option<&CanonicalEdge> {
        self.resolve(&Zone::from(a), &Zone::from(b))
            .map(|(idx, _)| self.edge_at(idx))
    }

    /// Stored value of the canonical edge `from -> to` at `at`.
    ///
    /// Only the canonical orientation is looked up; use
    /// [`flow_between`](Self::flow_between) for either direction.
    pub fn value_at(&self, from: &str, to: &str, at: &DateTime<Utc>) -> FlowValue {
        match self.resolve(&Zone::from(from), &Zone::from(to)) {
            Some((idx, Orientation::AsDeclared)) => self.edge_at(idx).value_at(at),
            _ => FlowValue::NoData,
        }
    }

    /// Flow seen from `from` toward `to`, or `None` if the zones share no edge
    pub fn flow_between(&self, from: &str, to: &str, at: &DateTime<Utc>) -> Option<FlowValue> {
        self.resolve(&Zone::from(from), &Zone::from(to))
            .map(|(idx, orientation)| match orientation {
                Orientation::AsDeclared => self.edge_at(idx).value_at(at),
                Orientation::Reversed => self.edge_at(idx).value_at(at).negate(),
            })
    }

    /// Sorted union of every timestamp present on any edge
    pub fn timeline(&self) -> Vec<DateTime<Utc>> {
        self.edges()
            .iter()
            .map(|e| e.flows.timestamps().copied())
            .kmerge()
            .dedup()
            .collect()
    }

    /// Timestamp at position `index` of [`timeline`](Self::timeline)
    pub fn timestamp_at(&self, index: usize) -> Option<DateTime<Utc>> {
        self.timeline().get(index).copied()
    }

    pub fn time_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let first = self.edges().iter().filter_map(|e| e.flows.first_timestamp()).min()?;
        let last = self.edges().iter().filter_map(|e| e.flows.last_timestamp()).max()?;
        Some((first, last))
    }

    /// One entry per canonical edge with its value at `at`
    pub fn snapshot_at(&self, at: &DateTime<Utc>) -> Vec<EdgeFlow> {
        self.edges()
            .iter()
            .map(|e| {
                let value = e.value_at(at);
                EdgeFlow {
                    from: e.from.clone(),
                    to: e.to.clone(),
                    value,
                    direction: value.as_option().map(FlowDirection::of),
                }
            })
            .collect()
    }

    /// Edges touching `zone`
    pub fn edges_of<'a>(&'a self, zone: &'a str) -> impl Iterator<Item = &'a CanonicalEdge> + 'a {
        self.edges()
            .iter()
            .filter(move |e| e.from.as_str() == zone || e.to.as_str() == zone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    fn t(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 7, hour, 0, 0).unwrap()
    }

    fn graph() -> FlowGraph {
        let mut g = FlowGraph::new();
        g.add_edge(&Zone::from("AT"), &Zone::from("HU"));
        g.add_edge(&Zone::from("HU"), &Zone::from("SK"));

        let at_hu: BTreeMap<_, _> = [(t(1), 100.0), (t(3), -20.0)].into_iter().collect();
        let hu_sk: BTreeMap<_, _> = [(t(2), 0.0), (t(3), 40.0)].into_iter().collect();
        g.edge_at_mut(0).flows.merge(&at_hu, Orientation::AsDeclared);
        g.edge_at_mut(1).flows.merge(&hu_sk, Orientation::AsDeclared);
        g
    }

    #[test]
    fn test_value_at() {
        let g = graph();
        assert_eq!(g.value_at("AT", "HU", &t(1)), FlowValue::Data(100.0));
        assert_eq!(g.value_at("AT", "HU", &t(2)), FlowValue::NoData);
        // not the canonical orientation
        assert_eq!(g.value_at("HU", "AT", &t(1)), FlowValue::NoData);
        assert_eq!(g.value_at("AT", "SK", &t(1)), FlowValue::NoData);
    }

    #[test]
    fn test_flow_between_either_direction() {
        let g = graph();
        assert_eq!(g.flow_between("HU", "AT", &t(1)), Some(FlowValue::Data(-100.0)));
        assert_eq!(g.flow_between("AT", "HU", &t(1)), Some(FlowValue::Data(100.0)));
        assert_eq!(g.flow_between("HU", "AT", &t(2)), Some(FlowValue::NoData));
        assert_eq!(g.flow_between("AT", "SK", &t(1)), None);
    }

    #[test]
    fn test_edge_lookup() {
        let g = graph();
        let edge = g.edge("HU", "AT").unwrap();
        assert_eq!(edge.from.as_str(), "AT");
        assert!(edge.connects("HU", "AT"));
        assert!(g.edge("AT", "SK").is_none());
        assert_eq!(g.edges_of("HU").count(), 2);
    }

    #[test]
    fn test_timeline_and_range() {
        let g = graph();
        assert_eq!(g.timeline(), vec![t(1), t(2), t(3)]);
        assert_eq!(g.timestamp_at(1), Some(t(2)));
        assert_eq!(g.timestamp_at(3), None);
        assert_eq!(g.time_range(), Some((t(1), t(3))));
        assert_eq!(FlowGraph::new().time_range(), None);
    }

    #[test]
    fn test_snapshot() {
        let g = graph();
        let snap = g.snapshot_at(&t(2));
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].value, FlowValue::NoData);
        assert_eq!(snap[0].direction, None);
        assert_eq!(snap[1].value, FlowValue::Data(0.0));
        assert_eq!(snap[1].direction, Some(FlowDirection::Idle));

        let snap = g.snapshot_at(&t(3));
        assert_eq!(snap[0].direction, Some(FlowDirection::Reverse));
        assert_eq!(snap[1].direction, Some(FlowDirection::Forward));
    }

    #[test]
    fn test_snapshot_serializes() {
        let g = graph();
        let json = serde_json::to_value(g.snapshot_at(&t(1))).unwrap();
        assert_eq!(json[0]["from"], "AT");
        assert_eq!(json[0]["value"]["Data"], 100.0);
        assert_eq!(json[1]["value"], "NoData");
    }
}
