//! Cross-border Flow Graph
//!
//! Turns a directory of `flows_<A>_<B>.csv` files into one directed graph with
//! a single canonical edge per bordering zone pair. Files reported in the
//! opposite direction are sign-flipped onto that edge, and every timestamp is
//! normalized to UTC so series from different files line up key for key.

pub mod builder;
pub mod error;
pub mod filename;
pub mod graph;
pub mod query;
pub mod series;

pub use builder::{
    build_flow_graph, build_with_timeout, BuildOptions, BuildOutcome, BuildReport,
    FlowGraphBuilder, MergePolicy, MergedFile, SkipReason, SkippedFile,
};
pub use error::FlowGraphError;
pub use filename::{FilenameError, FilenameParser, FlowPair};
pub use graph::{CanonicalEdge, FlowGraph};
pub use query::EdgeFlow;
pub use series::{parse_timestamp, read_series, NormalizedSeries, SeriesError};
