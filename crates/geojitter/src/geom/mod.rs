//! Planar geometry for regions.
//!
//! Purpose
//! - Represent the polygons a point must stay inside, answer point-in-region queries,
//!   and triangulate a polygon for guaranteed area-uniform sampling.
//!
//! Conventions
//! - Coordinates are `nalgebra::Vector2<f64>` (`Coord`), x first.
//! - Rings are closed; holes are supported for containment and triangulation.
//! - Membership of points exactly on a ring is implementation-defined (see `polygon`).

mod polygon;
mod triangulate;
mod types;

pub use polygon::{ring_area, ring_contains, Geometry, MultiPolygon, Polygon};
pub use triangulate::{Triangle, Triangulated};
pub use types::{Bounds2, Coord};
pub(crate) use types::is_finite;

#[cfg(test)]
mod tests;
