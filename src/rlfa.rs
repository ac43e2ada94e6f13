//! RFC 7490 remote loop-free alternates.
//!
//! Where no direct LFA exists, traffic can be tunnelled to a remote router
//! (a PQ-node) from which normal forwarding reaches the destination without
//! crossing the protected link. The engine computes, per ordered pair, the
//! P-space (or extended P-space) on the source side and the Q-space on the
//! destination side, intersects them into the PQ candidates, and assembles
//! each repair as a source-to-PQ tunnel segment joined to a PQ-to-target
//! descent segment.
//
// TODO: TI-LFA (segment-routed repairs using the node/adjacency SIDs the
// topology already carries) is not implemented.

use crate::all_paths::PathTable;
use crate::config::{PSpaceMode, RlfaConfig, TrombonePolicy};
use crate::error::FrrError;
use crate::path::{NodePath, NodePaths, Protection};
use crate::spf::SpfPaths;
use crate::topology::Topology;
use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use petgraph::graph::NodeIndex;
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Link- and node-protecting repair-tunnel paths for every ordered pair.
///
/// Every qualifying (PQ-node, tunnel path, descent path) combination is
/// emitted; no best-tunnel-only reduction is applied.
#[derive(Debug)]
pub struct RlfaPaths {
    topology: Arc<Topology>,
    table: PathTable,
    config: RlfaConfig,
}

impl RlfaPaths {
    pub fn new(
        topology: Arc<Topology>,
        spf_paths: &SpfPaths,
        config: RlfaConfig,
    ) -> Result<Self, FrrError> {
        let mut table = PathTable::new();
        for source in topology.node_indexes() {
            for target in topology.node_indexes() {
                if source == target {
                    continue;
                }
                let paths = repair_paths_between(&topology, spf_paths, config, source, target)?;
                table.insert(source, target, paths);
            }
        }
        let engine = Self {
            topology,
            table,
            config,
        };
        info!(
            paths = engine.path_count(),
            p_space = %config.p_space,
            trombone = %config.trombone,
            "calculated remote LFA paths"
        );
        Ok(engine)
    }

    /// The tagged repair paths from `source` to `target`; empty when none
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

    pub fn config(&self) -> RlfaConfig {
        self.config
    }

    pub fn topology(&self) -> &Arc<Topology> {
        &self.topology
    }
}

fn repair_paths_between(
    topology: &Arc<Topology>,
    spf: &SpfPaths,
    config: RlfaConfig,
    source: NodeIndex,
    target: NodeIndex,
) -> Result<NodePaths, FrrError> {
    let mut repairs = NodePaths::new();
    // Nothing to protect on a pair with no working path.
    if spf.paths_between(source, target).is_empty() {
        return Ok(repairs);
    }

    let q_space = q_space(topology, spf, source, target);
    let p_space = match config.p_space {
        PSpaceMode::Extended => extended_p_space(topology, spf, source, target)?,
        PSpaceMode::Plain => p_space(topology, spf, source, source, target)?,
    };
    // Intersection keeps the P/EP ordering.
    let pq_nodes: Vec<NodeIndex> = p_space
        .into_iter()
        .filter(|node| q_space.contains(node))
        .collect();
    trace!(
        source = topology.name(source).unwrap_or("?"),
        target = topology.name(target).unwrap_or("?"),
        pq = pq_nodes.len(),
        "PQ candidates"
    );

    let first_hops = spf.first_hops(source, target);
    for &pq_node in &pq_nodes {
        // A primary first hop cannot be the repair endpoint; with the
        // protected link down it is no longer the closest PQ-node.
        if first_hops.contains(&pq_node) {
            continue;
        }
        let tunnel = spf.paths_between(source, pq_node);
        let descent = spf.paths_between(pq_node, target);
        if config.trombone == TrombonePolicy::Forbid && has_trombone(tunnel, descent) {
            debug!(
                pq = topology.name(pq_node).unwrap_or("?"),
                "skipping trombone repair tunnel"
            );
            continue;
        }
        emit_repairs(topology, tunnel, descent, Protection::Link, &mut repairs)?;
    }

    for &pq_node in &pq_nodes {
        if first_hops.contains(&pq_node) {
            continue;
        }
        let tunnel = spf.paths_between(source, pq_node);
        let descent = spf.paths_between(pq_node, target);
        // RFC 7490 node failures, option 2: the descent from the repair
        // endpoint must avoid every pre-failure first hop, ECMP included.
        let overlap = first_hops.iter().any(|first_hop| {
            descent.iter().any(|path| path.contains(*first_hop))
        });
        if overlap {
            debug!(
                pq = topology.name(pq_node).unwrap_or("?"),
                "descent revisits a protected first hop, not node protecting"
            );
            continue;
        }
        if config.trombone == TrombonePolicy::Forbid && has_trombone(tunnel, descent) {
            debug!(
                pq = topology.name(pq_node).unwrap_or("?"),
                "skipping trombone repair tunnel"
            );
            continue;
        }
        emit_repairs(topology, tunnel, descent, Protection::Node, &mut repairs)?;
    }

    Ok(repairs)
}

/// Join every tunnel path with every descent path (the PQ-node is shared,
/// so the tunnel's last node is dropped) and append the result with the
/// given tag. A combination that would revisit a node cannot be represented
/// as a simple path and is skipped; with trombones forbidden none occur.
fn emit_repairs(
    topology: &Arc<Topology>,
    tunnel: &NodePaths,
    descent: &NodePaths,
    protection: Protection,
    repairs: &mut NodePaths,
) -> Result<(), FrrError> {
    for (tunnel_path, descent_path) in tunnel.iter().cartesian_product(descent.iter()) {
        let mut nodes: Vec<NodeIndex> =
            tunnel_path.nodes()[..tunnel_path.len() - 1].to_vec();
        nodes.extend_from_slice(descent_path.nodes());
        let distinct: IndexSet<NodeIndex> = nodes.iter().copied().collect();
        if distinct.len() != nodes.len() {
            debug!("skipping repair that revisits a node");
            continue;
        }
        let mut repair = NodePath::from_nodes(Arc::clone(topology), nodes)?;
        repair.protect(protection);
        debug!(%repair, "new remote LFA path");
        repairs.append(repair)?;
    }
    Ok(())
}

/// A trombone exists when a node of some tunnel path (the endpoint aside)
/// reappears on some descent path after its first node: the repaired packet
/// would cross its own tunnel on the way down.
fn has_trombone(tunnel: &NodePaths, descent: &NodePaths) -> bool {
    tunnel.iter().any(|tunnel_path| {
        let interior = &tunnel_path.nodes()[..tunnel_path.len() - 1];
        interior.iter().any(|hop| {
            descent
                .iter()
                .any(|descent_path| descent_path.nodes()[1..].contains(hop))
        })
    })
}

/// Q-space of the target with respect to the protected S-E link: routers
/// whose best paths reach the target without being drawn through the
/// source, i.e. cost(Q,D) < cost(Q,S) + cost(S,D).
fn q_space(
    topology: &Arc<Topology>,
    spf: &SpfPaths,
    source: NodeIndex,
    target: NodeIndex,
) -> IndexSet<NodeIndex> {
    let mut space = IndexSet::new();
    let Some(cost_s_t) = spf.cost(source, target) else {
        return space;
    };
    for node in topology.node_indexes() {
        if node == source || node == target {
            continue;
        }
        let (Some(cost_q_t), Some(cost_q_s)) =
            (spf.cost(node, target), spf.cost(node, source))
        else {
            continue;
        };
        if cost_q_t < cost_q_s + cost_s_t {
            space.insert(node);
        }
    }
    space
}

/// P-space of `root` with respect to the source's protected first-hop
/// link(s) toward the target.
///
/// A candidate qualifies when its own best paths to the target avoid the
/// source entirely and it is cheaper to reach from the root directly than
/// via the root's first hop toward the target:
/// cost(R,P) < min_fh cost(R,fh) + min_fh cost(fh,P), minima over the ECMP
/// first hops of R's best paths to the target. A first hop equal to the
/// candidate contributes no term; a candidate that is the only first hop is
/// skipped (it is rejected later as a primary first hop regardless).
fn p_space(
    topology: &Arc<Topology>,
    spf: &SpfPaths,
    root: NodeIndex,
    source: NodeIndex,
    target: NodeIndex,
) -> Result<Vec<NodeIndex>, FrrError> {
    let mut space = Vec::new();
    let root_paths = spf.paths_between(root, target);
    if root_paths.is_empty() {
        debug!(root = topology.name(root).unwrap_or("?"), "P-space is empty, no working path");
        return Ok(space);
    }
    let first_hops = root_paths.first_hop_nodes();
    let Some(first_hop_cost) = first_hops
        .iter()
        .filter_map(|first_hop| spf.cost(root, *first_hop))
        .min()
    else {
        return Ok(space);
    };

    for candidate in topology.node_indexes() {
        if candidate == root || candidate == source || candidate == target {
            continue;
        }
        let candidate_paths = spf.paths_between(candidate, target);
        if candidate_paths.is_empty() {
            continue;
        }
        // Excised subtree: the candidate would transit the source on its
        // own way to the target.
        if candidate_paths.iter().any(|path| path.contains(source)) {
            continue;
        }
        let Some(cost_to_candidate) = spf.cost(root, candidate) else {
            continue;
        };
        let Some(via_first_hop) = first_hops
            .iter()
            .filter(|first_hop| **first_hop != candidate)
            .filter_map(|first_hop| spf.cost(*first_hop, candidate))
            .min()
        else {
            continue;
        };
        if cost_to_candidate < first_hop_cost + via_first_hop {
            space.push(candidate);
        }
    }
    Ok(space)
}

/// Extended P-space: the union of the P-spaces of the source's neighbours,
/// each candidate admitted only if the packet, once at the neighbour, will
/// not be pulled back across the protected link:
/// cost(N,P) < cost(N,S) + cost(S,D) + cost(D,P).
fn extended_p_space(
    topology: &Arc<Topology>,
    spf: &SpfPaths,
    source: NodeIndex,
    target: NodeIndex,
) -> Result<Vec<NodeIndex>, FrrError> {
    let mut space = Vec::new();
    let neighbours: Vec<NodeIndex> = topology.router(source)?.neighbours().collect();
    for neighbour in neighbours {
        if neighbour == target {
            continue;
        }
        for candidate in p_space(topology, spf, neighbour, source, target)? {
            if space.contains(&candidate) {
                continue;
            }
            let costs = (
                spf.cost(neighbour, candidate),
                spf.cost(neighbour, source),
                spf.cost(source, target),
                spf.cost(target, candidate),
            );
            let (Some(cost_n_p), Some(cost_n_s), Some(cost_s_t), Some(cost_t_p)) = costs
            else {
                continue;
            };
            if cost_n_p < cost_n_s + cost_s_t + cost_t_p {
                space.push(candidate);
            }
        }
    }
    Ok(space)
}
