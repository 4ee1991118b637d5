use serde::Serialize;
use std::collections::HashMap;

use crate::domain::{FlowSeries, GeoPosition, Node, Orientation, Zone};

/// The single directed edge stored for an unordered zone pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalEdge {
    pub from: Zone,
    pub to: Zone,
    pub flows: FlowSeries,
}

/// Directed graph of zones and their canonical flow edges.
///
/// Built once by [`FlowGraphBuilder`](super::FlowGraphBuilder) and read-only
/// afterwards. Every zone referenced by an edge has a node, and every
/// unordered pair has at most one edge.
#[derive(Debug, Clone, Default)]
pub struct FlowGraph {
    nodes: Vec<Node>,
    node_index: HashMap<Zone, usize>,
    edges: Vec<CanonicalEdge>,
    edge_index: HashMap<(Zone, Zone), usize>,
}

impl FlowGraph {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds the node unless the zone is already present. A position given
    /// later fills in a node that was created without one.
    pub(crate) fn add_node(&mut self, zone: &Zone, position: Option<GeoPosition>) {
        match self.node_index.get(zone) {
            Some(&idx) => {
                let node = &mut self.nodes[idx];
                if node.position.is_none() {
                    node.position = position;
                }
            }
            None => {
                self.node_index.insert(zone.clone(), self.nodes.len());
                self.nodes.push(Node {
                    zone: zone.clone(),
                    position,
                });
            }
        }
    }

    /// Adds `from -> to` with an empty series unless either direction of the
    /// pair already has an edge. Returns whether an edge was created.
    pub(crate) fn add_edge(&mut self, from: &Zone, to: &Zone) -> bool {
        if self.resolve(from, to).is_some() {
            return false;
        }
        self.add_node(from, None);
        self.add_node(to, None);
        self.edge_index
            .insert((from.clone(), to.clone()), self.edges.len());
        self.edges.push(CanonicalEdge {
            from: from.clone(),
            to: to.clone(),
            flows: FlowSeries::new(),
        });
        true
    }

    /// Finds the canonical edge for a directed pair and how the pair lines up
    /// with it
    pub(crate) fn resolve(&self, sender: &Zone, recipient: &Zone) -> Option<(usize, Orientation)> {
        if let Some(&idx) = self.edge_index.get(&(sender.clone(), recipient.clone())) {
            return Some((idx, Orientation::AsDeclared));
        }
        self.edge_index
            .get(&(recipient.clone(), sender.clone()))
            .map(|&idx| (idx, Orientation::Reversed))
    }

    pub(crate) fn edge_at(&self, idx: usize) -> &CanonicalEdge {
        &self.edges[idx]
    }

    pub(crate) fn edge_at_mut(&mut self, idx: usize) -> &mut CanonicalEdge {
        &mut self.edges[idx]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[CanonicalEdge] {
        &self.edges
    }

    pub fn node(&self, zone: &str) -> Option<&Node> {
        self.node_index.get(zone).map(|&idx| &self.nodes[idx])
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Total number of stored flow points across all edges
    pub fn point_count(&self) -> usize {
        self.edges.iter().map(|e| e.flows.len()).sum()
    }
}
