//! IP/MPLS fast-reroute path computation.
//!
//! Given an undirected weighted topology of routers and links, the engines
//! in this crate produce, for every ordered pair of nodes:
//!
//! - every simple path ([`AllPaths`]),
//! - the equal-cost shortest paths ([`SpfPaths`]),
//! - RFC 5286 loop-free alternates ([`LfaPaths`]),
//! - RFC 7490 remote loop-free alternates ([`RlfaPaths`]).
//!
//! [`FrrPaths`] wires the engines in dependency order and owns the results.

pub mod all_paths;
pub mod config;
pub mod error;
pub mod lfa;
pub mod path;
pub mod rlfa;
pub mod spf;
pub mod topology;

pub use crate::all_paths::AllPaths;
pub use crate::config::{PSpaceMode, RlfaConfig, TrombonePolicy};
pub use crate::error::FrrError;
pub use crate::lfa::LfaPaths;
pub use crate::path::{EdgePath, EdgePaths, NodePath, NodePaths, Protection, ProtectionSet};
pub use crate::rlfa::RlfaPaths;
pub use crate::spf::SpfPaths;
pub use crate::topology::Topology;

use std::sync::Arc;

/// All four path families for one topology.
///
/// Construction is strictly ordered: the topology is frozen first, then
/// the simple-path enumeration runs, then the SPF filter over it, and only
/// then the LFA and remote-LFA engines that consume the SPF costs. Each
/// result is immutable once its engine has been built.
#[derive(Debug)]
pub struct FrrPaths {
    topology: Arc<Topology>,
    all_paths: AllPaths,
    spf_paths: SpfPaths,
    lfa_paths: LfaPaths,
    rlfa_paths: RlfaPaths,
}

impl FrrPaths {
    pub fn new(topology: Topology, config: RlfaConfig) -> Result<Self, FrrError> {
        let topology = Arc::new(topology);
        let all_paths = AllPaths::new(Arc::clone(&topology))?;
        let spf_paths = SpfPaths::new(Arc::clone(&topology), &all_paths)?;
        let lfa_paths = LfaPaths::new(Arc::clone(&topology), &spf_paths)?;
        let rlfa_paths = RlfaPaths::new(Arc::clone(&topology), &spf_paths, config)?;
        Ok(Self {
            topology,
            all_paths,
            spf_paths,
            lfa_paths,
            rlfa_paths,
        })
    }

    /// Load the topology from a JSON file and compute everything.
    pub fn from_json_file(
        path: impl AsRef<std::path::Path>,
        config: RlfaConfig,
    ) -> Result<Self, FrrError> {
        Self::new(Topology::from_json_file(path)?, config)
    }

    pub fn topology(&self) -> &Arc<Topology> {
        &self.topology
    }

    pub fn all_paths(&self) -> &AllPaths {
        &self.all_paths
    }

    pub fn spf_paths(&self) -> &SpfPaths {
        &self.spf_paths
    }

    pub fn lfa_paths(&self) -> &LfaPaths {
        &self.lfa_paths
    }

    pub fn rlfa_paths(&self) -> &RlfaPaths {
        &self.rlfa_paths
    }
}
