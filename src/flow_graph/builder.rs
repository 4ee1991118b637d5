use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use strum::{Display, EnumString};
use tracing::{debug, info, warn};

use super::error::FlowGraphError;
use super::filename::{FilenameError, FilenameParser, DEFAULT_PREFIX, DEFAULT_SUFFIX};
use super::graph::FlowGraph;
use super::series::read_series;
use crate::config::Config;
use crate::domain::{Orientation, Zone};
use crate::topology::Topology;

/// What happens when a file carries a value for a timestamp the edge
/// already has
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MergePolicy {
    /// The later file replaces the earlier value
    #[default]
    LastWriteWins,
    /// A file that would change an existing value is skipped entirely.
    /// Identical values are accepted as redundant.
    RejectConflicts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Merge files in file-name order instead of directory order
    pub sort_files: bool,
    pub merge_policy: MergePolicy,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            sort_files: true,
            merge_policy: MergePolicy::LastWriteWins,
        }
    }
}

/// Why a file contributed nothing to the graph
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SkipReason {
    InvalidName(String),
    UnparseableName(FilenameError),
    UndeclaredPair { sender: Zone, recipient: Zone },
    Unreadable(String),
    Conflict { from: Zone, to: Zone, timestamps: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedFile {
    pub file: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedFile {
    pub file: String,
    pub from: Zone,
    pub to: Zone,
    pub orientation: Orientation,
    pub points: usize,
    pub overwritten: usize,
}

/// Per-file trail of a build
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildReport {
    pub merged: Vec<MergedFile>,
    pub skipped: Vec<SkippedFile>,
    pub rows_dropped: usize,
}

impl BuildReport {
    pub fn files_seen(&self) -> usize {
        self.merged.len() + self.skipped.len()
    }
}

#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub graph: FlowGraph,
    pub report: BuildReport,
}

/// Assembles a [`FlowGraph`] from a topology and a directory of flow files.
///
/// Each call to [`build`](Self::build) starts from a fresh skeleton; nothing
/// is cached between builds.
#[derive(Debug, Clone)]
pub struct FlowGraphBuilder {
    topology: Topology,
    parser: FilenameParser,
    options: BuildOptions,
}

impl FlowGraphBuilder {
    /// Builder with default options. Compound codes for filename parsing are
    /// taken from the topology.
    pub fn new(topology: Topology) -> Self {
        let parser = FilenameParser::new(DEFAULT_PREFIX, DEFAULT_SUFFIX, topology.compound_codes());
        Self {
            topology,
            parser,
            options: BuildOptions::default(),
        }
    }

    pub fn from_config(cfg: &Config) -> Result<Self, FlowGraphError> {
        let topology = match &cfg.topology.path {
            Some(path) => Topology::load(path)?,
            None => Topology::european(),
        };
        Ok(Self::new(topology)
            .with_parser(cfg.parser.filename_parser())
            .with_options(cfg.build.options()))
    }

    pub fn with_parser(mut self, parser: FilenameParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Nodes and empty canonical edges straight from the topology
    pub fn seed(&self) -> FlowGraph {
        let mut graph = FlowGraph::new();
        for entry in self.topology.zones() {
            graph.add_node(&entry.code, entry.position);
        }
        for (zone, neighbor) in self.topology.declared_pairs() {
            if zone == neighbor {
                warn!(%zone, "ignoring self-neighbor declaration");
                continue;
            }
            graph.add_edge(zone, neighbor);
        }
        graph
    }

    pub fn build(&self, dir: &Path) -> Result<BuildOutcome, FlowGraphError> {
        let mut graph = self.seed();
        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            dir = %dir.display(),
            "seeded flow graph"
        );

        let files = self.list_files(dir)?;
        let mut report = BuildReport::default();
        for path in files {
            let file = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            match self.merge_file(&mut graph, &path, &mut report.rows_dropped) {
                Ok(merged) => report.merged.push(merged),
                Err(reason) => {
                    warn!(file = %file, reason = ?reason, "skipping flow file");
                    report.skipped.push(SkippedFile { file, reason });
                }
            }
        }

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            points = graph.point_count(),
            merged = report.merged.len(),
            skipped = report.skipped.len(),
            rows_dropped = report.rows_dropped,
            "built flow graph"
        );
        Ok(BuildOutcome { graph, report })
    }

    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>, FlowGraphError> {
        let unreadable = |source| FlowGraphError::DirectoryUnreadable {
            path: dir.display().to_string(),
            source,
        };

        let meta = fs::metadata(dir).map_err(unreadable)?;
        if !meta.is_dir() {
            return Err(FlowGraphError::NotADirectory {
                path: dir.display().to_string(),
            });
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(unreadable)? {
            let path = entry.map_err(unreadable)?.path();
            if path.is_file() {
                files.push(path);
            } else {
                debug!(path = %path.display(), "ignoring non-file entry");
            }
        }

        if self.options.sort_files {
            files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        }
        Ok(files)
    }

    fn merge_file(
        &self,
        graph: &mut FlowGraph,
        path: &Path,
        rows_dropped: &mut usize,
    ) -> Result<MergedFile, SkipReason> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| SkipReason::InvalidName(path.display().to_string()))?;
        let pair = self.parser.parse(name).map_err(SkipReason::UnparseableName)?;

        let (idx, orientation) = graph.resolve(&pair.sender, &pair.recipient).ok_or_else(|| {
            SkipReason::UndeclaredPair {
                sender: pair.sender.clone(),
                recipient: pair.recipient.clone(),
            }
        })?;

        let series = read_series(path).map_err(|e| SkipReason::Unreadable(e.to_string()))?;
        *rows_dropped += series.rows_dropped;
        if series.rows_dropped > 0 {
            debug!(file = name, dropped = series.rows_dropped, "dropped rows");
        }

        let edge = graph.edge_at(idx);
        if self.options.merge_policy == MergePolicy::RejectConflicts {
            let conflicts = edge.flows.conflicts(&series.points, orientation);
            if !conflicts.is_empty() {
                return Err(SkipReason::Conflict {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    timestamps: conflicts.len(),
                });
            }
        }

        let edge = graph.edge_at_mut(idx);
        let overwritten = edge.flows.merge(&series.points, orientation);
        debug!(
            file = name,
            from = %edge.from,
            to = %edge.to,
            %orientation,
            points = series.points.len(),
            overwritten,
            "merged flow file"
        );

        Ok(MergedFile {
            file: name.to_string(),
            from: edge.from.clone(),
            to: edge.to.clone(),
            orientation,
            points: series.points.len(),
            overwritten,
        })
    }
}

/// Build with the built-in topology and default options
pub fn build_flow_graph(dir: &Path) -> Result<FlowGraph, FlowGraphError> {
    FlowGraphBuilder::new(Topology::european())
        .build(dir)
        .map(|outcome| outcome.graph)
}

/// Run a build on the blocking pool and give up after `timeout`.
///
/// A build that overruns keeps going in the background, but its result is
/// dropped; callers never see a partial graph.
pub async fn build_with_timeout(
    builder: FlowGraphBuilder,
    dir: PathBuf,
    timeout: Duration,
) -> Result<BuildOutcome, FlowGraphError> {
    let task = tokio::task::spawn_blocking(move || builder.build(&dir));
    match tokio::time::timeout(timeout, task).await {
        Ok(joined) => joined.map_err(|e| FlowGraphError::Join(e.to_string()))?,
        Err(_) => Err(FlowGraphError::TimedOut(timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::ZoneEntry;

    fn at_hu_builder() -> FlowGraphBuilder {
        let topology = Topology::new(vec![
            ZoneEntry::new("AT", &["HU"], None),
            ZoneEntry::new("HU", &["AT"], None),
        ])
        .unwrap();
        FlowGraphBuilder::new(topology)
    }

    #[test]
    fn test_seed_one_edge_per_pair() {
        let graph = FlowGraphBuilder::new(Topology::european()).seed();
        assert_eq!(graph.node_count(), 13);
        // 42 declared pairs, every border listed from both sides
        assert_eq!(graph.edge_count(), 21);
        assert!(graph.edges().iter().all(|e| e.flows.is_empty()));

        let fr_de = graph.edge("DE_LU", "FR").unwrap();
        assert_eq!(fr_de.from.as_str(), "FR");
    }

    #[test]
    fn test_seed_creates_undeclared_neighbor_nodes() {
        let topology = Topology::new(vec![ZoneEntry::new("AT", &["CH"], None)]).unwrap();
        let graph = FlowGraphBuilder::new(topology).seed();
        assert_eq!(graph.node_count(), 2);
        assert!(graph.node("CH").unwrap().position.is_none());
    }

    #[test]
    fn test_seed_ignores_self_neighbor() {
        let topology = Topology::new(vec![ZoneEntry::new("AT", &["AT", "HU"], None)]).unwrap();
        let graph = FlowGraphBuilder::new(topology).seed();
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_missing_directory_is_fatal() {
        let err = at_hu_builder()
            .build(Path::new("/definitely/not/here"))
            .unwrap_err();
        assert!(matches!(err, FlowGraphError::DirectoryUnreadable { .. }));
    }

    #[test]
    fn test_merge_policy_names() {
        assert_eq!(MergePolicy::RejectConflicts.to_string(), "reject_conflicts");
        assert_eq!(
            "last_write_wins".parse::<MergePolicy>().unwrap(),
            MergePolicy::LastWriteWins
        );
    }
}
