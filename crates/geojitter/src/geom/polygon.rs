//! Polygons, multipolygons and the tagged `Geometry` a region is made of.
//!
//! Rings are stored closed (`first == last`). Containment uses the crossing-number
//! rule behind a bounding-box reject.
//!
//! Boundary membership is implementation-defined. The half-open straddle test
//! `(a.y > p.y) != (b.y > p.y)` together with the strict `p.x < x_cross` comparison
//! means that, for an axis-aligned rectangle, points on the bottom and left edges
//! count as inside while points on the top and right edges count as outside. Nothing
//! special-cases points exactly on an edge.

use serde::{Deserialize, Serialize};

use super::types::{is_finite, Bounds2, Coord};
use crate::error::{GeoError, Result};

/// Crossing-number test against a single ring. Open or closed rings both work.
pub fn ring_contains(ring: &[Coord], p: Coord) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = ring[i];
        let b = ring[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Unsigned shoelace area of a ring.
pub fn ring_area(ring: &[Coord]) -> f64 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    for i in 0..n {
        let p = ring[i];
        let q = ring[(i + 1) % n];
        twice += p.x * q.y - q.x * p.y;
    }
    0.5 * twice.abs()
}

/// Validate and close a ring. Needs at least three distinct finite vertices.
fn close_ring(mut ring: Vec<Coord>) -> Result<Vec<Coord>> {
    if let Some(bad) = ring.iter().find(|p| !is_finite(**p)) {
        return Err(GeoError::ring(format!("non-finite vertex ({}, {})", bad.x, bad.y)));
    }
    if ring.len() >= 2 && ring.first() == ring.last() {
        ring.pop();
    }
    let mut distinct = ring.clone();
    distinct.sort_by(|a, b| {
        a.x.partial_cmp(&b.x)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.y.partial_cmp(&b.y).unwrap_or(std::cmp::Ordering::Equal))
    });
    distinct.dedup();
    if distinct.len() < 3 {
        return Err(GeoError::ring(format!(
            "need at least 3 distinct vertices, got {}",
            distinct.len()
        )));
    }
    let first = ring[0];
    ring.push(first);
    Ok(ring)
}

/// Simple polygon with optional holes.
///
/// Invariants:
/// - Every ring is closed and has at least three distinct finite vertices.
/// - `bounds` is the bounding box of the exterior ring.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PolygonRepr", into = "PolygonRepr")]
pub struct Polygon {
    exterior: Vec<Coord>,
    holes: Vec<Vec<Coord>>,
    bounds: Bounds2,
}

impl Polygon {
    pub fn new(exterior: Vec<Coord>) -> Result<Self> {
        Self::with_holes(exterior, Vec::new())
    }

    pub fn with_holes(exterior: Vec<Coord>, holes: Vec<Vec<Coord>>) -> Result<Self> {
        let exterior = close_ring(exterior)?;
        let holes = holes
            .into_iter()
            .map(close_ring)
            .collect::<Result<Vec<_>>>()?;
        let bounds = Bounds2::from_points(exterior.iter().copied())
            .ok_or_else(|| GeoError::ring("exterior ring has no finite bounds"))?;
        Ok(Self {
            exterior,
            holes,
            bounds,
        })
    }

    /// Axis-aligned rectangle, counter-clockwise from `min`.
    pub fn rect(min: Coord, max: Coord) -> Result<Self> {
        Self::new(vec![
            min,
            Coord::new(max.x, min.y),
            max,
            Coord::new(min.x, max.y),
        ])
    }

    #[inline]
    pub fn exterior(&self) -> &[Coord] {
        &self.exterior
    }

    #[inline]
    pub fn holes(&self) -> &[Vec<Coord>] {
        &self.holes
    }

    #[inline]
    pub fn bounds(&self) -> Bounds2 {
        self.bounds
    }

    /// Inside the exterior and outside every hole.
    pub fn contains(&self, p: Coord) -> bool {
        self.bounds.contains(p)
            && ring_contains(&self.exterior, p)
            && !self.holes.iter().any(|h| ring_contains(h, p))
    }

    pub fn area(&self) -> f64 {
        let holes: f64 = self.holes.iter().map(|h| ring_area(h)).sum();
        (ring_area(&self.exterior) - holes).max(0.0)
    }
}

#[derive(Serialize, Deserialize)]
struct PolygonRepr {
    exterior: Vec<Coord>,
    #[serde(default)]
    holes: Vec<Vec<Coord>>,
}

impl TryFrom<PolygonRepr> for Polygon {
    type Error = GeoError;
    fn try_from(r: PolygonRepr) -> Result<Self> {
        Polygon::with_holes(r.exterior, r.holes)
    }
}

impl From<Polygon> for PolygonRepr {
    fn from(p: Polygon) -> Self {
        PolygonRepr {
            exterior: p.exterior,
            holes: p.holes,
        }
    }
}

/// Non-empty collection of polygons, assumed pairwise disjoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Polygon>", into = "Vec<Polygon>")]
pub struct MultiPolygon {
    parts: Vec<Polygon>,
    bounds: Bounds2,
}

impl MultiPolygon {
    pub fn new(parts: Vec<Polygon>) -> Result<Self> {
        let mut it = parts.iter().map(Polygon::bounds);
        let first = it
            .next()
            .ok_or_else(|| GeoError::ring("multipolygon needs at least one part"))?;
        let bounds = it.fold(first, |acc, b| acc.union(&b));
        Ok(Self { parts, bounds })
    }

    #[inline]
    pub fn parts(&self) -> &[Polygon] {
        &self.parts
    }

    #[inline]
    pub fn bounds(&self) -> Bounds2 {
        self.bounds
    }

    pub fn contains(&self, p: Coord) -> bool {
        self.bounds.contains(p) && self.parts.iter().any(|part| part.contains(p))
    }
}

impl TryFrom<Vec<Polygon>> for MultiPolygon {
    type Error = GeoError;
    fn try_from(parts: Vec<Polygon>) -> Result<Self> {
        MultiPolygon::new(parts)
    }
}

impl From<MultiPolygon> for Vec<Polygon> {
    fn from(m: MultiPolygon) -> Self {
        m.parts
    }
}

/// A feature geometry as it arrives from a region layer.
///
/// Only the areal variants can serve as obfuscation regions; the others exist so that
/// layers mixing kinds can be represented and rejected explicitly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Coord },
    LineString { coordinates: Vec<Coord> },
    Polygon(Polygon),
    MultiPolygon { parts: MultiPolygon },
}

impl Geometry {
    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Point { .. } => "Point",
            Geometry::LineString { .. } => "LineString",
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiPolygon { .. } => "MultiPolygon",
        }
    }

    /// Constituent polygons, or `InvalidGeometryKind` for geometries without area.
    pub fn areal_parts(&self) -> Result<&[Polygon]> {
        match self {
            Geometry::Polygon(p) => Ok(std::slice::from_ref(p)),
            Geometry::MultiPolygon { parts } => Ok(parts.parts()),
            other => Err(GeoError::InvalidGeometryKind { kind: other.kind() }),
        }
    }

    /// Point-in-region test. Geometries without area contain nothing.
    pub fn contains(&self, p: Coord) -> bool {
        match self {
            Geometry::Polygon(poly) => poly.contains(p),
            Geometry::MultiPolygon { parts } => parts.contains(p),
            _ => false,
        }
    }

    pub fn bounds(&self) -> Option<Bounds2> {
        match self {
            Geometry::Point { coordinates } => Some(Bounds2::new(*coordinates, *coordinates)),
            Geometry::LineString { coordinates } => {
                Bounds2::from_points(coordinates.iter().copied())
            }
            Geometry::Polygon(p) => Some(p.bounds()),
            Geometry::MultiPolygon { parts } => Some(parts.bounds()),
        }
    }
}

impl From<Polygon> for Geometry {
    fn from(p: Polygon) -> Self {
        Geometry::Polygon(p)
    }
}

impl From<MultiPolygon> for Geometry {
    fn from(parts: MultiPolygon) -> Self {
        Geometry::MultiPolygon { parts }
    }
}
