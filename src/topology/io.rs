//! The JSON wire format for topologies.
//!
//! The document shape is the node-link form emitted by common graph
//! tooling: a `nodes` list keyed by `id` and a `links` list keyed by
//! `source`/`target`, with optional `weight` and SID attributes. Links
//! listed in only one direction are mirrored on load.

use crate::error::FrrError;
use crate::topology::Topology;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use tracing::{error, info};

/// A topology document. `directed` and `multigraph`, when present, must be
/// `false`; the public interface is an undirected simple graph even though
/// parallel edges exist internally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyData {
    #[serde(default)]
    pub directed: bool,
    #[serde(default)]
    pub multigraph: bool,
    pub nodes: Vec<NodeData>,
    pub links: Vec<LinkData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeData {
    #[serde(deserialize_with = "name_or_int")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_sid: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkData {
    #[serde(deserialize_with = "name_or_int")]
    pub source: String,
    #[serde(deserialize_with = "name_or_int")]
    pub target: String,
    /// Missing weight means 0; a 0 weight is omitted on output.
    #[serde(default, skip_serializing_if = "weight_is_default")]
    pub weight: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adj_sid: Option<u32>,
}

fn weight_is_default(weight: &u32) -> bool {
    *weight == 0
}

/// Node ids may appear as JSON strings or integers; integers are coerced to
/// their decimal string form.
fn name_or_int<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    })
}

impl Topology {
    /// Build a topology from a parsed document.
    ///
    /// Links with an endpoint missing from the node list, and self-loops,
    /// are logged and skipped; they do not fail the load.
    pub fn from_data(data: TopologyData) -> Result<Self, FrrError> {
        if data.directed {
            return Err(FrrError::InvalidValue {
                message: "directed topologies are not supported".to_owned(),
            });
        }
        if data.multigraph {
            return Err(FrrError::InvalidValue {
                message: "multigraph topologies are not supported".to_owned(),
            });
        }

        let mut topology = Topology::new();
        for node in &data.nodes {
            topology.add_router(&node.id, node.node_sid);
        }

        for link in &data.links {
            let Ok(local) = topology.node_index(&link.source) else {
                error!(
                    source = %link.source,
                    target = %link.target,
                    "can't add link, source is not in topology"
                );
                continue;
            };
            let Ok(remote) = topology.node_index(&link.target) else {
                error!(
                    source = %link.source,
                    target = %link.target,
                    "can't add link, target is not in topology"
                );
                continue;
            };
            if let Err(err) = topology.add_link(local, remote, link.weight, link.adj_sid) {
                error!(
                    source = %link.source,
                    target = %link.target,
                    %err,
                    "skipping link"
                );
            }
        }

        topology.mirror_missing_links()?;
        info!(
            nodes = topology.node_count(),
            edges = topology.edge_count(),
            "created topology"
        );
        Ok(topology)
    }

    pub fn from_json_str(json: &str) -> Result<Self, FrrError> {
        let data: TopologyData = serde_json::from_str(json)?;
        Self::from_data(data)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, FrrError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| FrrError::Io {
            path: path.to_owned(),
            source,
        })?;
        let mut topology = Self::from_json_str(&json)?;
        topology.set_source_file(path.to_owned());
        Ok(topology)
    }

    /// Serialize back to document form. Every directed half-edge becomes a
    /// link entry, so each undirected link appears in both directions.
    pub fn to_data(&self) -> Result<TopologyData, FrrError> {
        let mut nodes = Vec::with_capacity(self.node_count());
        let mut links = Vec::with_capacity(self.edge_count());
        for node in self.node_indexes() {
            let router = self.router(node)?;
            nodes.push(NodeData {
                id: router.name().to_owned(),
                node_sid: router.node_sid(),
            });
            for neighbour in router.neighbours() {
                for &edge in router.edges_toward(neighbour) {
                    let link = self.link(edge)?;
                    links.push(LinkData {
                        source: router.name().to_owned(),
                        target: self.name(neighbour)?.to_owned(),
                        weight: link.weight(),
                        adj_sid: link.adj_sid(),
                    });
                }
            }
        }
        Ok(TopologyData {
            directed: false,
            multigraph: false,
            nodes,
            links,
        })
    }

    pub fn to_json_string(&self) -> Result<String, FrrError> {
        Ok(serde_json::to_string_pretty(&self.to_data()?)?)
    }

    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<(), FrrError> {
        let path = path.as_ref();
        let json = self.to_json_string()?;
        std::fs::write(path, json).map_err(|source| FrrError::Io {
            path: path.to_owned(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"{
        "directed": false,
        "nodes": [{"id": "A"}, {"id": "B", "node_sid": 16002}, {"id": 3}],
        "links": [
            {"source": "A", "target": "B", "weight": 10},
            {"source": "B", "target": 3},
            {"source": "A", "target": "Z", "weight": 1}
        ]
    }"#;

    #[test]
    fn loads_and_mirrors() {
        let topology = Topology::from_json_str(DOCUMENT).unwrap();
        assert_eq!(topology.node_count(), 3);
        // A-B and B-3 both ways; the dangling A-Z link is skipped.
        assert_eq!(topology.edge_count(), 4);
        assert!(topology.contains("3"));
        let b = topology.node_index("B").unwrap();
        let three = topology.node_index("3").unwrap();
        let edges = topology.router(three).unwrap().edges_toward(b);
        assert_eq!(topology.link(edges[0]).unwrap().weight(), 0);
    }

    #[test]
    fn rejects_directed_documents() {
        let result = Topology::from_json_str(r#"{"directed": true, "nodes": [], "links": []}"#);
        assert!(matches!(result, Err(FrrError::InvalidValue { .. })));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            Topology::from_json_str("not json"),
            Err(FrrError::Parse(_))
        ));
    }

    #[test]
    fn zero_weight_is_omitted_on_output() {
        let topology = Topology::from_json_str(DOCUMENT).unwrap();
        let json = topology.to_json_string().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let links = value["links"].as_array().unwrap();
        assert!(links
            .iter()
            .filter(|link| link["source"] == "B" && link["target"] == "3")
            .all(|link| link.get("weight").is_none()));
    }
}
