//! RFC 5286 loop-free alternates.

use crate::all_paths::PathTable;
use crate::error::FrrError;
use crate::path::{NodePaths, Protection, ProtectionSet};
use crate::spf::SpfPaths;
use crate::topology::Topology;
use indexmap::IndexMap;
use petgraph::graph::NodeIndex;
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Loop-free alternate paths for every ordered pair, classified by the
/// protection they provide.
///
/// For each neighbour N of the source that is neither the target nor a
/// primary next hop, the RFC 5286 inequalities are evaluated against SPF
/// pair costs; each of N's SPF paths to the target is then emitted once,
/// prefixed with the source and tagged with the full set of protections the
/// neighbour earned. A neighbour with no available cost term (including the
/// degenerate cost to a directly-connected target) is skipped outright.
#[derive(Debug)]
pub struct LfaPaths {
    topology: Arc<Topology>,
    table: PathTable,
}

impl LfaPaths {
    pub fn new(topology: Arc<Topology>, spf_paths: &SpfPaths) -> Result<Self, FrrError> {
        let mut table = PathTable::new();
        for source in topology.node_indexes() {
            for target in topology.node_indexes() {
                if source == target {
                    continue;
                }
                let paths = alternates_between(&topology, spf_paths, source, target)?;
                table.insert(source, target, paths);
            }
        }
        let engine = Self { topology, table };
        info!(paths = engine.path_count(), "calculated LFA paths");
        Ok(engine)
    }

    /// The tagged alternates from `source` to `target`; empty when none
    /// qualify.
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

    pub fn topology(&self) -> &Arc<Topology> {
        &self.topology
    }
}

fn alternates_between(
    topology: &Arc<Topology>,
    spf: &SpfPaths,
    source: NodeIndex,
    target: NodeIndex,
) -> Result<NodePaths, FrrError> {
    let mut alternates = NodePaths::new();
    let best_paths = spf.paths_between(source, target);
    if best_paths.is_empty() {
        return Ok(alternates);
    }

    let first_hops = best_paths.first_hop_nodes();
    // All ECMP paths share one cost, so any first hop serves as the
    // representative E for the node-protection inequality.
    let Some(&next_hop) = first_hops.first() else {
        return Ok(alternates);
    };
    let Some(cost_s_t) = spf.cost(source, target) else {
        return Ok(alternates);
    };

    let neighbours: Vec<NodeIndex> = topology.router(source)?.neighbours().collect();
    for neighbour in neighbours {
        if neighbour == target {
            // Directly connected; an alternate cannot beat the link itself.
            continue;
        }
        if first_hops.contains(&neighbour) {
            debug!(
                neighbour = topology.name(neighbour).unwrap_or("?"),
                "rejected, already a primary next hop"
            );
            continue;
        }

        let costs = (
            spf.cost(neighbour, target),
            spf.cost(neighbour, source),
            spf.cost(neighbour, next_hop),
            spf.cost(next_hop, target),
        );
        let (Some(cost_n_t), Some(cost_n_s), Some(cost_n_e), Some(cost_e_t)) = costs else {
            // Some pair is unreachable; this neighbour cannot be evaluated.
            continue;
        };

        trace!(
            neighbour = topology.name(neighbour).unwrap_or("?"),
            cost_n_t,
            cost_n_s,
            cost_s_t,
            cost_n_e,
            cost_e_t,
            "evaluating RFC 5286 inequalities"
        );

        let mut protection = ProtectionSet::empty();
        // Inequality 1, loop-free criterion: N's path to the target does
        // not come back through the source.
        if cost_n_t < cost_n_s + cost_s_t {
            protection.insert(Protection::Link);
        }
        // Inequality 2, downstream path criterion.
        if cost_n_t < cost_s_t {
            protection.insert(Protection::Downstream);
        }
        // Inequality 3, node protection against the primary next hop E,
        // kept only when no pre-failure ECMP first hop reappears on any of
        // N's best paths (the post-failure traffic must survive whichever
        // ECMP member actually failed).
        let neighbour_paths = spf.paths_between(neighbour, target);
        if cost_n_t < cost_n_e + cost_e_t {
            let overlap = first_hops.iter().any(|first_hop| {
                neighbour_paths
                    .iter()
                    .any(|path| path.contains(*first_hop))
            });
            if overlap {
                debug!(
                    neighbour = topology.name(neighbour).unwrap_or("?"),
                    "not node protecting, overlaps a pre-failure first hop"
                );
            } else {
                protection.insert(Protection::Node);
            }
        }

        if protection.is_empty() {
            continue;
        }

        for path in neighbour_paths {
            let mut alternate = path.prepended(source)?;
            alternate.set_protection(protection);
            debug!(%alternate, "new LFA path");
            alternates.append(alternate)?;
        }
    }
    Ok(alternates)
}
