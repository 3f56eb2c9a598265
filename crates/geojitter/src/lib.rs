//! Coordinate obfuscation for spatially embedded networks.
//!
//! Nodes of a network carry planar coordinates; obfuscation replaces each coordinate
//! with a random substitute (inside the node's region, or within a radius of it) while
//! node ids, edges and every other attribute stay exactly as they were. The comparison
//! layer then measures how far the edge-length distribution drifted.
//!
//! Layout
//! - `geom`: polygons, point-in-polygon, constrained triangulation.
//! - `network`: the attributed undirected network and coordinate extraction.
//! - `region`: keyed region collections and node → region resolution.
//! - `partition`: regular grids over a network, boundary filtering.
//! - `strategy`: uniform-in-region, fixed-radius and kNN-radius sampling.
//! - `engine`: applies a strategy to every node under a failure policy.
//! - `compare`: Wasserstein, KS and displacement quartiles over edge lengths.
//!
//! Nothing here performs I/O or holds global RNG state; every random draw comes from a
//! generator the caller passes in or a seed the caller sets.

pub mod compare;
pub mod engine;
pub mod error;
pub mod geom;
pub mod network;
pub mod partition;
pub mod region;
pub mod strategy;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use error::{FailureKind, GeoError, Result};

/// Common exports for callers.
pub mod prelude {
    pub use crate::compare::{compare, CompareCfg, Comparison, Displacement, KsResult, Quartiles};
    pub use crate::engine::{obfuscate, NodeFailure, ObfuscateCfg, Obfuscated, ReplayToken};
    pub use crate::error::{FailureKind, GeoError};
    pub use crate::geom::{Bounds2, Coord, Geometry, MultiPolygon, Polygon};
    pub use crate::network::{AttrValue, Attributes, CoordExtractor, Network, NodeId, XyExtractor};
    pub use crate::partition::{filter_by_region, grid_partition, GridCfg, GridPartition};
    pub use crate::region::{
        AttributeResolver, ContainmentResolver, RegionAssignment, RegionKey, RegionResolver,
        RegionSet,
    };
    pub use crate::strategy::{SampleOutcome, Strategy, UniformCfg};
}
