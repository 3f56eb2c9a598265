//! Error types shared across the crate.
//!
//! Two layers:
//! - `GeoError`: anything that aborts a call. Invalid geometry kinds and degenerate
//!   triangulations always land here, whatever the failure policy.
//! - `FailureKind`: why a single node could not be obfuscated. Under the graceful policy
//!   these are collected; under the strict policy the first one becomes
//!   `GeoError::NodeFailed`.

use std::fmt;

use thiserror::Error;

use crate::network::NodeId;
use crate::region::RegionKey;

pub type Result<T> = std::result::Result<T, GeoError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    /// A strategy or filter received a geometry without area.
    #[error("region must be a Polygon or MultiPolygon, got {kind}")]
    InvalidGeometryKind { kind: &'static str },

    #[error("invalid ring: {reason}")]
    InvalidRing { reason: String },

    /// The triangulation fallback found no triangle of positive area.
    #[error("triangulation of region {} produced no triangles", RegionLabel(.region))]
    DegenerateTriangulation { region: Option<RegionKey> },

    #[error("invalid parameters: {reason}")]
    InvalidParams { reason: String },

    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// A node without a readable coordinate where one is required (grid, edge lengths).
    #[error("node {0} has no coordinate")]
    MissingCoordinate(NodeId),

    #[error("edge {a}-{b} is missing from a trial network")]
    MissingEdge { a: NodeId, b: NodeId },

    #[error("empty input: {what}")]
    Empty { what: &'static str },

    /// Strict policy: the first per-node failure, with the node that caused it.
    #[error("unable to obfuscate node {node}: {kind}")]
    NodeFailed { node: NodeId, kind: FailureKind },
}

impl GeoError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidParams {
            reason: reason.into(),
        }
    }

    pub(crate) fn ring(reason: impl Into<String>) -> Self {
        Self::InvalidRing {
            reason: reason.into(),
        }
    }

    /// Attach a region key to a triangulation failure raised below the engine.
    pub(crate) fn in_region(self, key: &RegionKey) -> Self {
        match self {
            Self::DegenerateTriangulation { region: None } => Self::DegenerateTriangulation {
                region: Some(key.clone()),
            },
            other => other,
        }
    }
}

/// Per-node failure; recoverable under the graceful policy.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FailureKind {
    #[error("node has no coordinate")]
    MissingCoordinate,
    #[error("node resolves to no region")]
    MissingRegion,
    #[error("region {0} is not in the region set")]
    UnknownRegion(RegionKey),
    #[error("no point found inside the region")]
    NoPointFound,
}

struct RegionLabel<'a>(&'a Option<RegionKey>);

impl fmt::Display for RegionLabel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(key) => write!(f, "{key}"),
            None => f.write_str("<unlabelled>"),
        }
    }
}
