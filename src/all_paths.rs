//! Exhaustive simple-path enumeration.

use crate::error::FrrError;
use crate::path::{NodePath, NodePaths};
use crate::topology::Topology;
use indexmap::IndexMap;
use petgraph::graph::NodeIndex;
use std::sync::Arc;
use tracing::info;

/// Pair-keyed path storage shared by every engine: one [`NodePaths`] per
/// ordered (source, target) pair, plus the query surface over it.
#[derive(Debug, Default)]
pub(crate) struct PathTable {
    paths: IndexMap<NodeIndex, IndexMap<NodeIndex, NodePaths>>,
    empty: NodePaths,
}

impl PathTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, source: NodeIndex, target: NodeIndex, paths: NodePaths) {
        self.paths.entry(source).or_default().insert(target, paths);
    }

    pub(crate) fn paths_between(&self, source: NodeIndex, target: NodeIndex) -> &NodePaths {
        self.paths
            .get(&source)
            .and_then(|targets| targets.get(&target))
            .unwrap_or(&self.empty)
    }

    pub(crate) fn paths_from(
        &self,
        source: NodeIndex,
    ) -> Option<&IndexMap<NodeIndex, NodePaths>> {
        self.paths.get(&source)
    }

    pub(crate) fn path_count(&self) -> usize {
        self.paths
            .values()
            .flat_map(IndexMap::values)
            .map(NodePaths::len)
            .sum()
    }
}

/// Every simple path between every ordered pair of nodes.
///
/// Enumeration is a depth-first search over the neighbour lists, driven by
/// an explicit cursor stack rather than recursion; output order follows
/// neighbour insertion order, so results are deterministic for a given
/// document. Nothing is capped: path counts grow exponentially with mesh
/// density and that is accepted.
#[derive(Debug)]
pub struct AllPaths {
    topology: Arc<Topology>,
    table: PathTable,
}

impl AllPaths {
    pub fn new(topology: Arc<Topology>) -> Result<Self, FrrError> {
        let mut table = PathTable::new();
        for source in topology.node_indexes() {
            for target in topology.node_indexes() {
                if source == target {
                    continue;
                }
                let paths = simple_paths_between(&topology, source, target)?;
                table.insert(source, target, paths);
            }
        }
        let engine = Self { topology, table };
        info!(paths = engine.path_count(), "calculated all simple paths");
        Ok(engine)
    }

    /// All simple paths from `source` to `target`; empty when disconnected.
    pub fn paths_between(&self, source: NodeIndex, target: NodeIndex) -> &NodePaths {
        self.table.paths_between(source, target)
    }

    pub fn paths_between_by_name(&self, source: &str, target: &str) -> Result<&NodePaths, FrrError> {
        let source = self.topology.node_index(source)?;
        let target = self.topology.node_index(target)?;
        Ok(self.paths_between(source, target))
    }

    /// All computed paths from `source`, keyed by target.
    pub fn paths_from(&self, source: NodeIndex) -> Option<&IndexMap<NodeIndex, NodePaths>> {
        self.table.paths_from(source)
    }

    /// Total number of simple paths across all pairs.
    pub fn path_count(&self) -> usize {
        self.table.path_count()
    }

    pub fn topology(&self) -> &Arc<Topology> {
        &self.topology
    }
}

/// Depth-first enumeration of the simple paths from `source` to `target`.
///
/// `cursors[i]` is the position within the neighbour list of `path[i]`
/// still to be explored; a node is expanded only if it is not already on
/// the current path, and reaching `target` records a copy without
/// descending further.
fn simple_paths_between(
    topology: &Arc<Topology>,
    source: NodeIndex,
    target: NodeIndex,
) -> Result<NodePaths, FrrError> {
    let mut found = NodePaths::new();
    let mut path: Vec<NodeIndex> = vec![source];
    let mut cursors: Vec<usize> = vec![0];

    while let Some(cursor) = cursors.last_mut() {
        let current = path[path.len() - 1];
        let next = topology.router(current)?.neighbour_at(*cursor);
        match next {
            Some(next) => {
                *cursor += 1;
                if path.contains(&next) {
                    continue;
                }
                if next == target {
                    let mut nodes = path.clone();
                    nodes.push(next);
                    found.append(NodePath::from_nodes(Arc::clone(topology), nodes)?)?;
                    continue;
                }
                path.push(next);
                cursors.push(0);
            }
            None => {
                cursors.pop();
                path.pop();
            }
        }
    }
    Ok(found)
}
