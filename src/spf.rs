//! Equal-cost shortest-path filtering.

use crate::all_paths::{AllPaths, PathTable};
use crate::error::FrrError;
use crate::path::NodePaths;
use crate::topology::Topology;
use indexmap::IndexMap;
use petgraph::graph::NodeIndex;
use std::sync::Arc;
use tracing::info;

/// The equal-cost lowest-weight subset of [`AllPaths`] for every ordered
/// pair. ECMP ties are all retained.
#[derive(Debug)]
pub struct SpfPaths {
    topology: Arc<Topology>,
    table: PathTable,
}

impl SpfPaths {
    pub fn new(topology: Arc<Topology>, all_paths: &AllPaths) -> Result<Self, FrrError> {
        let mut table = PathTable::new();
        for source in topology.node_indexes() {
            for target in topology.node_indexes() {
                if source == target {
                    continue;
                }
                let best = all_paths.paths_between(source, target).lowest_weighted();
                table.insert(source, target, best);
            }
        }
        let engine = Self { topology, table };
        info!(paths = engine.path_count(), "calculated SPF paths");
        Ok(engine)
    }

    /// The ECMP set from `source` to `target`; empty when disconnected.
    pub fn paths_between(&self, source: NodeIndex, target: NodeIndex) -> &NodePaths {
        self.table.paths_between(source, target)
    }

    pub fn paths_between_by_name(&self, source: &str, target: &str) -> Result<&NodePaths, FrrError> {
        let source = self.topology.node_index(source)?;
        let target = self.topology.node_index(target)?;
        Ok(self.paths_between(source, target))
    }

    pub fn paths_from(&self, source: NodeIndex) -> Option<&IndexMap<NodeIndex, NodePaths>> {
        self.table.paths_from(source)
    }

    pub fn path_count(&self) -> usize {
        self.table.path_count()
    }

    /// Cost of the best path between the pair. Fails with
    /// [`FrrError::NoPath`] when the pair is disconnected.
    pub fn path_cost_between(&self, source: NodeIndex, target: NodeIndex) -> Result<u64, FrrError> {
        self.cost(source, target).ok_or_else(|| FrrError::NoPath {
            source_name: self
                .topology
                .name(source)
                .unwrap_or("?")
                .to_owned(),
            target_name: self
                .topology
                .name(target)
                .unwrap_or("?")
                .to_owned(),
        })
    }

    /// Best-path cost as an option: `None` when the pair is disconnected or
    /// degenerate (source == target). A genuine zero-weight path is
    /// `Some(0)`, distinct from absence.
    pub(crate) fn cost(&self, source: NodeIndex, target: NodeIndex) -> Option<u64> {
        if source == target {
            return None;
        }
        self.paths_between(source, target).lowest_weight()
    }

    /// First hops of the ECMP set for the pair, de-duplicated in path order.
    pub(crate) fn first_hops(&self, source: NodeIndex, target: NodeIndex) -> Vec<NodeIndex> {
        self.paths_between(source, target).first_hop_nodes()
    }

    pub fn topology(&self) -> &Arc<Topology> {
        &self.topology
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A-B direct (weight 5) and A-C-B around (weight 2+2), so the indirect
    /// route wins; D is isolated.
    fn detour() -> Arc<Topology> {
        let mut topology = Topology::new();
        let a = topology.add_router("A", None);
        let b = topology.add_router("B", None);
        let c = topology.add_router("C", None);
        topology.add_router("D", None);
        topology.add_link(a, b, 5, None).unwrap();
        topology.add_link(a, c, 2, None).unwrap();
        topology.add_link(c, b, 2, None).unwrap();
        topology.mirror_missing_links().unwrap();
        Arc::new(topology)
    }

    fn engine(topology: &Arc<Topology>) -> SpfPaths {
        let all = AllPaths::new(Arc::clone(topology)).unwrap();
        SpfPaths::new(Arc::clone(topology), &all).unwrap()
    }

    #[test]
    fn picks_lowest_weight_path() {
        let topology = detour();
        let spf = engine(&topology);
        let paths = spf.paths_between_by_name("A", "B").unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(
            paths.get(0).unwrap().node_names().unwrap(),
            vec!["A".to_owned(), "C".to_owned(), "B".to_owned()]
        );
        assert_eq!(paths.lowest_weight(), Some(4));
    }

    #[test]
    fn cost_query_fails_on_disconnected_pair() {
        let topology = detour();
        let spf = engine(&topology);
        let a = topology.node_index("A").unwrap();
        let d = topology.node_index("D").unwrap();
        assert!(matches!(
            spf.path_cost_between(a, d),
            Err(FrrError::NoPath { .. })
        ));
        assert_eq!(spf.cost(a, d), None);
        assert_eq!(spf.cost(a, a), None);
    }

    #[test]
    fn ecmp_ties_are_retained() {
        let mut topology = Topology::new();
        let a = topology.add_router("A", None);
        let b = topology.add_router("B", None);
        let c = topology.add_router("C", None);
        let d = topology.add_router("D", None);
        topology.add_link(a, b, 1, None).unwrap();
        topology.add_link(b, d, 1, None).unwrap();
        topology.add_link(a, c, 1, None).unwrap();
        topology.add_link(c, d, 1, None).unwrap();
        topology.mirror_missing_links().unwrap();
        let topology = Arc::new(topology);
        let spf = engine(&topology);
        let paths = spf.paths_between_by_name("A", "D").unwrap();
        assert_eq!(paths.len(), 2);
        let hops = paths.first_hop_nodes();
        assert_eq!(hops.len(), 2);
    }
}
