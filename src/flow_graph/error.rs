use std::time::Duration;
use thiserror::Error;

use crate::topology::TopologyError;

/// Failures that abort a whole build. Per-file problems never end up here;
/// they are recorded in the build report instead.
#[derive(Debug, Error)]
pub enum FlowGraphError {
    #[error("Cannot read flow directory {path}: {source}")]
    DirectoryUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Flow path {path} is not a directory")]
    NotADirectory { path: String },

    #[error("Topology error: {0}")]
    Topology(#[from] TopologyError),

    #[error("Build did not finish within {0:?}")]
    TimedOut(Duration),

    #[error("Build task failed: {0}")]
    Join(String),
}
