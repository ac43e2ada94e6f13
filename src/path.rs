//! Path primitives.
//!
//! A [`NodePath`] is a simple (no repeated node) walk through the topology;
//! it owns the full set of [`EdgePath`] realisations of that walk, one per
//! combination of parallel edges. Collections ([`NodePaths`], [`EdgePaths`])
//! keep their members in non-decreasing weight order and expose no mutation
//! that can break that order.

use crate::error::FrrError;
use crate::topology::Topology;
use petgraph::graph::{EdgeIndex, NodeIndex};
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use strum::IntoEnumIterator;

/// The protection classes a backup path can provide (RFC 5286 / RFC 7490).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display, strum_macros::EnumIter,
)]
pub enum Protection {
    #[strum(to_string = "link")]
    Link,
    #[strum(to_string = "downstream")]
    Downstream,
    #[strum(to_string = "node")]
    Node,
}

impl Protection {
    const fn bit(self) -> u8 {
        match self {
            Protection::Link => 1 << 0,
            Protection::Downstream => 1 << 1,
            Protection::Node => 1 << 2,
        }
    }
}

/// The set of protection classes carried by a path. The LFA engine only
/// emits paths whose set is non-empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ProtectionSet(u8);

impl ProtectionSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn with(self, protection: Protection) -> Self {
        Self(self.0 | protection.bit())
    }

    pub fn insert(&mut self, protection: Protection) {
        self.0 |= protection.bit();
    }

    pub const fn contains(self, protection: Protection) -> bool {
        self.0 & protection.bit() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Protection> {
        Protection::iter().filter(move |protection| self.contains(*protection))
    }
}

impl Display for ProtectionSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for protection in self.iter() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{protection}")?;
            first = false;
        }
        Ok(())
    }
}

/// One traversal of a specific edge: the edge index plus its resolved
/// endpoints and weight, so a built path never needs to go back to the
/// graph for arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hop {
    pub edge: EdgeIndex,
    pub local: NodeIndex,
    pub remote: NodeIndex,
    pub weight: u32,
}

/// A contiguous sequence of edges: each hop starts where the previous one
/// ended. Weight is the sum of hop weights.
#[derive(Debug, Clone)]
pub struct EdgePath {
    topology: Arc<Topology>,
    hops: Vec<Hop>,
    weight: u64,
}

impl EdgePath {
    pub(crate) fn empty(topology: Arc<Topology>) -> Self {
        Self {
            topology,
            hops: Vec::new(),
            weight: 0,
        }
    }

    /// Append one edge. Fails when the edge does not continue the path or
    /// already appears on it.
    pub(crate) fn push(&mut self, edge: EdgeIndex) -> Result<(), FrrError> {
        let (local, remote) = self.topology.edge_endpoints(edge)?;
        if let Some(last) = self.hops.last() {
            if last.remote != local {
                return Err(FrrError::InvalidValue {
                    message: "edge does not continue the path".to_owned(),
                });
            }
        }
        if self.contains(edge) {
            return Err(FrrError::InvalidValue {
                message: "edge already on the path".to_owned(),
            });
        }
        let weight = self.topology.link(edge)?.weight();
        self.hops.push(Hop {
            edge,
            local,
            remote,
            weight,
        });
        self.weight += u64::from(weight);
        Ok(())
    }

    pub(crate) fn pop(&mut self) -> Option<Hop> {
        let hop = self.hops.pop()?;
        self.weight -= u64::from(hop.weight);
        Some(hop)
    }

    pub fn contains(&self, edge: EdgeIndex) -> bool {
        self.hops.iter().any(|hop| hop.edge == edge)
    }

    pub fn hops(&self) -> &[Hop] {
        &self.hops
    }

    pub fn len(&self) -> usize {
        self.hops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    /// First node of the path, when the path has any hops.
    pub fn source(&self) -> Option<NodeIndex> {
        self.hops.first().map(|hop| hop.local)
    }

    /// Last node of the path, when the path has any hops.
    pub fn target(&self) -> Option<NodeIndex> {
        self.hops.last().map(|hop| hop.remote)
    }

    pub fn weight(&self) -> u64 {
        self.weight
    }
}

impl Display for EdgePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Weight {}: [", self.weight)?;
        for (i, hop) in self.hops.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            let local = self.topology.name(hop.local).map_err(|_| std::fmt::Error)?;
            let remote = self.topology.name(hop.remote).map_err(|_| std::fmt::Error)?;
            write!(f, "{local}->{remote}")?;
        }
        write!(f, "]")
    }
}

/// Edge paths in non-decreasing weight order.
#[derive(Debug, Clone, Default)]
pub struct EdgePaths {
    paths: Vec<EdgePath>,
}

impl EdgePaths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert keeping weight order; an equal-weight path lands after the
    /// existing equals (stable).
    pub fn insert(&mut self, path: EdgePath) {
        let at = self
            .paths
            .partition_point(|existing| existing.weight() <= path.weight());
        self.paths.insert(at, path);
    }

    pub fn lowest_weight(&self) -> Option<u64> {
        self.paths.first().map(EdgePath::weight)
    }

    /// The leading run of paths tied at the minimum weight.
    pub fn lowest_weighted(&self) -> EdgePaths {
        let Some(lowest) = self.lowest_weight() else {
            return EdgePaths::new();
        };
        EdgePaths {
            paths: self
                .paths
                .iter()
                .take_while(|path| path.weight() == lowest)
                .cloned()
                .collect(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&EdgePath> {
        self.paths.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EdgePath> {
        self.paths.iter()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl<'a> IntoIterator for &'a EdgePaths {
    type Item = &'a EdgePath;
    type IntoIter = std::slice::Iter<'a, EdgePath>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}

impl Display for EdgePaths {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for path in &self.paths {
            writeln!(f, "{path}")?;
        }
        Ok(())
    }
}

/// A simple node path from source to target, together with every edge-path
/// realisation of it and the protection classes it has been found to offer.
#[derive(Debug, Clone)]
pub struct NodePath {
    topology: Arc<Topology>,
    nodes: Vec<NodeIndex>,
    protection: ProtectionSet,
    edge_paths: EdgePaths,
}

impl NodePath {
    /// Build a path from a node sequence, expanding the edge paths.
    ///
    /// Fails when the sequence is empty, repeats a node, or steps between
    /// two nodes with no edge between them.
    pub fn from_nodes(topology: Arc<Topology>, nodes: Vec<NodeIndex>) -> Result<Self, FrrError> {
        if nodes.is_empty() {
            return Err(FrrError::InvalidValue {
                message: "a node path cannot be empty".to_owned(),
            });
        }
        for (i, node) in nodes.iter().enumerate() {
            if nodes[..i].contains(node) {
                return Err(FrrError::InvalidValue {
                    message: format!(
                        "node {name} repeats on the path",
                        name = topology.name(*node)?
                    ),
                });
            }
        }
        let edge_paths = expand_edge_paths(&topology, &nodes)?;
        Ok(Self {
            topology,
            nodes,
            protection: ProtectionSet::empty(),
            edge_paths,
        })
    }

    /// A copy of this path with `node` prepended. The copy starts with an
    /// empty protection set.
    pub fn prepended(&self, node: NodeIndex) -> Result<Self, FrrError> {
        let mut nodes = Vec::with_capacity(self.nodes.len() + 1);
        nodes.push(node);
        nodes.extend_from_slice(&self.nodes);
        Self::from_nodes(Arc::clone(&self.topology), nodes)
    }

    pub fn nodes(&self) -> &[NodeIndex] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<NodeIndex> {
        self.nodes.get(index).copied()
    }

    pub fn contains(&self, node: NodeIndex) -> bool {
        self.nodes.contains(&node)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn source(&self) -> NodeIndex {
        self.nodes[0]
    }

    pub fn target(&self) -> NodeIndex {
        self.nodes[self.nodes.len() - 1]
    }

    /// Weight of the cheapest edge-path realisation; 0 for a single-node
    /// path.
    pub fn weight(&self) -> u64 {
        self.edge_paths.lowest_weight().unwrap_or(0)
    }

    pub fn edge_paths(&self) -> &EdgePaths {
        &self.edge_paths
    }

    pub fn protection(&self) -> ProtectionSet {
        self.protection
    }

    pub(crate) fn protect(&mut self, protection: Protection) {
        self.protection.insert(protection);
    }

    pub(crate) fn set_protection(&mut self, protection: ProtectionSet) {
        self.protection = protection;
    }

    pub fn is_link_protecting(&self) -> bool {
        self.protection.contains(Protection::Link)
    }

    pub fn is_downstream_protecting(&self) -> bool {
        self.protection.contains(Protection::Downstream)
    }

    pub fn is_node_protecting(&self) -> bool {
        self.protection.contains(Protection::Node)
    }

    /// Router names along the path, in order.
    pub fn node_names(&self) -> Result<Vec<String>, FrrError> {
        self.nodes
            .iter()
            .map(|node| self.topology.name(*node).map(str::to_owned))
            .collect()
    }
}

impl Display for NodePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Weight {}: [", self.weight())?;
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            let name = self.topology.name(*node).map_err(|_| std::fmt::Error)?;
            write!(f, "{name}")?;
        }
        write!(f, "]")?;
        if !self.protection.is_empty() {
            write!(f, " protecting: {}", self.protection)?;
        }
        Ok(())
    }
}

/// Expand a node sequence into every edge path that realises it, choosing
/// one of the parallel edges at each step. Result is weight-ordered.
fn expand_edge_paths(
    topology: &Arc<Topology>,
    nodes: &[NodeIndex],
) -> Result<EdgePaths, FrrError> {
    let mut paths = EdgePaths::new();
    if nodes.len() < 2 {
        return Ok(paths);
    }
    let mut steps: Vec<&[EdgeIndex]> = Vec::with_capacity(nodes.len() - 1);
    for pair in nodes.windows(2) {
        let edges = topology.router(pair[0])?.edges_toward(pair[1]);
        if edges.is_empty() {
            return Err(FrrError::InvalidValue {
                message: format!(
                    "no edge between {local} and {remote}",
                    local = topology.name(pair[0])?,
                    remote = topology.name(pair[1])?
                ),
            });
        }
        steps.push(edges);
    }
    let mut current = EdgePath::empty(Arc::clone(topology));
    expand_step(&steps, &mut current, &mut paths)?;
    Ok(paths)
}

fn expand_step(
    steps: &[&[EdgeIndex]],
    current: &mut EdgePath,
    paths: &mut EdgePaths,
) -> Result<(), FrrError> {
    let depth = current.len();
    if depth == steps.len() {
        paths.insert(current.clone());
        return Ok(());
    }
    for &edge in steps[depth] {
        // A repeated edge cannot occur along a simple node path; skip it
        // if it somehow does.
        if current.contains(edge) {
            continue;
        }
        current.push(edge)?;
        expand_step(steps, current, paths)?;
        current.pop();
    }
    Ok(())
}

/// Node paths between one (source, target) pair, in non-decreasing weight
/// order.
#[derive(Debug, Clone, Default)]
pub struct NodePaths {
    paths: Vec<NodePath>,
}

impl NodePaths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert keeping weight order (ties after existing equals). Fails with
    /// [`FrrError::EndpointMismatch`] when the path's endpoints differ from
    /// the collection's.
    pub fn append(&mut self, path: NodePath) -> Result<(), FrrError> {
        if let Some(first) = self.paths.first() {
            if first.source() != path.source() || first.target() != path.target() {
                return Err(FrrError::EndpointMismatch {
                    path_source: name_of(&path, path.source()),
                    path_target: name_of(&path, path.target()),
                    expected_source: name_of(first, first.source()),
                    expected_target: name_of(first, first.target()),
                });
            }
        }
        let at = self
            .paths
            .partition_point(|existing| existing.weight() <= path.weight());
        self.paths.insert(at, path);
        Ok(())
    }

    pub fn source(&self) -> Option<NodeIndex> {
        self.paths.first().map(NodePath::source)
    }

    pub fn target(&self) -> Option<NodeIndex> {
        self.paths.first().map(NodePath::target)
    }

    pub fn lowest_weight(&self) -> Option<u64> {
        self.paths.first().map(NodePath::weight)
    }

    /// The leading run of paths tied at the minimum weight (the ECMP set).
    pub fn lowest_weighted(&self) -> NodePaths {
        let Some(lowest) = self.lowest_weight() else {
            return NodePaths::new();
        };
        NodePaths {
            paths: self
                .paths
                .iter()
                .take_while(|path| path.weight() == lowest)
                .cloned()
                .collect(),
        }
    }

    /// De-duplicated first-hop nodes across the lowest-weight paths, in
    /// path order.
    pub fn first_hop_nodes(&self) -> Vec<NodeIndex> {
        let Some(lowest) = self.lowest_weight() else {
            return Vec::new();
        };
        let mut hops = Vec::new();
        for path in self
            .paths
            .iter()
            .take_while(|path| path.weight() == lowest)
        {
            if let Some(hop) = path.node(1) {
                if !hops.contains(&hop) {
                    hops.push(hop);
                }
            }
        }
        hops
    }

    pub fn get(&self, index: usize) -> Option<&NodePath> {
        self.paths.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NodePath> {
        self.paths.iter()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

fn name_of(path: &NodePath, node: NodeIndex) -> String {
    path.topology
        .name(node)
        .map(str::to_owned)
        .unwrap_or_else(|_| format!("#{}", node.index()))
}

impl<'a> IntoIterator for &'a NodePaths {
    type Item = &'a NodePath;
    type IntoIter = std::slice::Iter<'a, NodePath>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}

impl Display for NodePaths {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for path in &self.paths {
            writeln!(f, "{path}")?;
        }
        Ok(())
    }
}
