pub mod config;
pub mod domain;
pub mod flow_graph;
pub mod telemetry;
pub mod topology;

pub use domain::{FlowDirection, FlowSeries, FlowValue, GeoPosition, Node, Orientation, Zone};
pub use flow_graph::{
    build_flow_graph, BuildOutcome, BuildReport, CanonicalEdge, FlowGraph, FlowGraphBuilder,
    FlowGraphError,
};
pub use topology::Topology;
