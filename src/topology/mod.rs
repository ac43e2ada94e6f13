use crate::error::FrrError;
use indexmap::IndexMap;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

mod io;

pub use io::{LinkData, NodeData, TopologyData};

/// A router in the topology.
///
/// Identity is the name; the node may additionally carry a segment-routing
/// node SID. Adjacency lives here as an ordered map from neighbour to the
/// ordered list of parallel edges toward that neighbour, so that neighbour
/// iteration order is exactly insertion order.
#[derive(Debug)]
pub struct Router {
    name: String,
    node_sid: Option<u32>,
    edges: IndexMap<NodeIndex, Vec<EdgeIndex>>,
}

impl Router {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node_sid(&self) -> Option<u32> {
        self.node_sid
    }

    /// Neighbours in insertion order.
    pub fn neighbours(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.edges.keys().copied()
    }

    pub fn neighbour_at(&self, index: usize) -> Option<NodeIndex> {
        self.edges.get_index(index).map(|(node, _)| *node)
    }

    pub fn neighbour_count(&self) -> usize {
        self.edges.len()
    }

    /// The ordered edge list toward a neighbour; empty if there is none.
    pub fn edges_toward(&self, neighbour: NodeIndex) -> &[EdgeIndex] {
        self.edges
            .get(&neighbour)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Total number of outgoing half-edges on this router.
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }
}

/// One directed half of an undirected link.
///
/// Every link loaded from a document is stored as two of these, one per
/// direction, with equal weights; the adjacency SIDs of the two halves are
/// independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    weight: u32,
    adj_sid: Option<u32>,
}

impl Link {
    pub fn weight(&self) -> u32 {
        self.weight
    }

    pub fn adj_sid(&self) -> Option<u32> {
        self.adj_sid
    }
}

/// The undirected weighted graph of routers and links.
///
/// Backed by a petgraph arena so nodes and edges are addressed by small
/// integer indexes; name resolution goes through an insertion-ordered map.
/// A topology is immutable once loaded.
#[derive(Debug, Default)]
pub struct Topology {
    graph: DiGraph<Router, Link>,
    names: IndexMap<String, NodeIndex>,
    source_file: Option<PathBuf>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a router by name. Inserting a name that already exists is a
    /// no-op returning the existing index.
    pub fn add_router(&mut self, name: &str, node_sid: Option<u32>) -> NodeIndex {
        if let Some(node) = self.names.get(name) {
            return *node;
        }
        let node = self.graph.add_node(Router {
            name: name.to_owned(),
            node_sid,
            edges: IndexMap::new(),
        });
        self.names.insert(name.to_owned(), node);
        node
    }

    /// Insert one directed half-edge and register the neighbour relation on
    /// the local router. The companion half-edge is not created here; the
    /// loader mirrors one-directional links in a separate pass.
    pub fn add_link(
        &mut self,
        local: NodeIndex,
        remote: NodeIndex,
        weight: u32,
        adj_sid: Option<u32>,
    ) -> Result<EdgeIndex, FrrError> {
        if self.graph.node_weight(local).is_none() || self.graph.node_weight(remote).is_none() {
            return Err(FrrError::InvalidTopology {
                message: "link endpoint is not in the topology".to_owned(),
            });
        }
        if local == remote {
            return Err(FrrError::InvalidTopology {
                message: format!(
                    "link from {name} to itself is not allowed",
                    name = self.router(local)?.name()
                ),
            });
        }
        let edge = self.graph.add_edge(local, remote, Link { weight, adj_sid });
        self.router_mut(local)?
            .edges
            .entry(remote)
            .or_default()
            .push(edge);
        Ok(edge)
    }

    /// Synthesize the swapped twin of every half-edge whose reverse
    /// direction is missing, so that the undirected invariant holds. Weight
    /// and adjacency SID are carried over from the forward half.
    pub(crate) fn mirror_missing_links(&mut self) -> Result<(), FrrError> {
        let mut missing: Vec<(NodeIndex, NodeIndex, u32, Option<u32>)> = Vec::new();
        for node in self.graph.node_indices() {
            for (&neighbour, edges) in &self.router(node)?.edges {
                if !self.router(neighbour)?.edges_toward(node).is_empty() {
                    continue;
                }
                for &edge in edges {
                    let link = self.link(edge)?;
                    missing.push((neighbour, node, link.weight, link.adj_sid));
                }
            }
        }
        for (local, remote, weight, adj_sid) in missing {
            self.add_link(local, remote, weight, adj_sid)?;
        }
        Ok(())
    }

    pub fn router(&self, node: NodeIndex) -> Result<&Router, FrrError> {
        self.graph.node_weight(node).ok_or_else(|| FrrError::Internal {
            message: "router unexpectedly missing".to_owned(),
        })
    }

    fn router_mut(&mut self, node: NodeIndex) -> Result<&mut Router, FrrError> {
        self.graph
            .node_weight_mut(node)
            .ok_or_else(|| FrrError::Internal {
                message: "router unexpectedly missing".to_owned(),
            })
    }

    pub fn link(&self, edge: EdgeIndex) -> Result<&Link, FrrError> {
        self.graph.edge_weight(edge).ok_or_else(|| FrrError::Internal {
            message: "link unexpectedly missing".to_owned(),
        })
    }

    pub fn edge_endpoints(&self, edge: EdgeIndex) -> Result<(NodeIndex, NodeIndex), FrrError> {
        self.graph.edge_endpoints(edge).ok_or_else(|| FrrError::Internal {
            message: "link unexpectedly missing".to_owned(),
        })
    }

    /// The router's name, for messages and serialization.
    pub fn name(&self, node: NodeIndex) -> Result<&str, FrrError> {
        Ok(self.router(node)?.name())
    }

    /// Resolve a router by name.
    pub fn node_index(&self, name: &str) -> Result<NodeIndex, FrrError> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| FrrError::UnknownNode {
                name: name.to_owned(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// All node indexes in insertion order.
    pub fn node_indexes(&self) -> impl Iterator<Item = NodeIndex> {
        self.graph.node_indices()
    }

    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of directed half-edges (twice the undirected link count).
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// The file this topology was loaded from, when it came from disk.
    pub fn source_file(&self) -> Option<&Path> {
        self.source_file.as_deref()
    }

    pub(crate) fn set_source_file(&mut self, path: PathBuf) {
        self.source_file = Some(path);
    }
}

impl Display for Topology {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let data = match self.to_data() {
            Ok(data) => data,
            Err(_) => return Err(std::fmt::Error),
        };
        let json = serde_json::to_string_pretty(&data).map_err(|_| std::fmt::Error)?;
        f.write_str(&json)
    }
}
