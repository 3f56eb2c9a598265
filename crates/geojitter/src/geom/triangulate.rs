//! Constrained Delaunay triangulation of a polygon and area-weighted point sampling.
//!
//! Model
//! - Insert every ring vertex into a `spade` CDT and add each ring segment as a
//!   constraint edge, so no triangle crosses the boundary or a hole.
//! - Keep the triangles whose centroid lies inside the polygon (drops the convex-hull
//!   filler outside concave boundaries and inside holes).
//! - Sample by choosing a triangle with probability proportional to its area and then
//!   a uniform point in it via barycentric weights `u=1-√r1, v=√r1(1-r2), w=√r1·r2`.
//!
//! The result is uniform over the polygon's area and always terminates.

use rand::Rng;
use spade::handles::FixedVertexHandle;
use spade::{ConstrainedDelaunayTriangulation, Point2, Triangulation as _};

use super::polygon::Polygon;
use super::types::Coord;
use crate::error::{GeoError, Result};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    pub a: Coord,
    pub b: Coord,
    pub c: Coord,
}

impl Triangle {
    #[inline]
    pub fn new(a: Coord, b: Coord, c: Coord) -> Self {
        Self { a, b, c }
    }

    pub fn area(&self) -> f64 {
        let ab = self.b - self.a;
        let ac = self.c - self.a;
        0.5 * (ab.x * ac.y - ab.y * ac.x).abs()
    }

    #[inline]
    pub fn centroid(&self) -> Coord {
        (self.a + self.b + self.c) / 3.0
    }

    /// Uniform point inside the triangle.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Coord {
        let r1: f64 = rng.gen();
        let r2: f64 = rng.gen();
        let s = r1.sqrt();
        let u = 1.0 - s;
        let v = s * (1.0 - r2);
        let w = s * r2;
        self.a * u + self.b * v + self.c * w
    }
}

/// Triangles of one polygon plus their cumulative area table.
#[derive(Clone, Debug)]
pub struct Triangulated {
    triangles: Vec<Triangle>,
    cumulative: Vec<f64>,
}

impl Triangulated {
    /// Triangulate `poly`, honoring its rings as constraint segments.
    ///
    /// Returns `DegenerateTriangulation` (without a region key; the engine adds it) when
    /// no triangle of positive area survives, e.g. for a collinear ring.
    pub fn of_polygon(poly: &Polygon) -> Result<Self> {
        let mut cdt: ConstrainedDelaunayTriangulation<Point2<f64>> =
            ConstrainedDelaunayTriangulation::new();
        insert_ring(&mut cdt, poly.exterior())?;
        for hole in poly.holes() {
            insert_ring(&mut cdt, hole)?;
        }

        let mut triangles = Vec::with_capacity(cdt.num_inner_faces());
        for face in cdt.inner_faces() {
            let [p, q, r] = face.vertices().map(|v| {
                let pos = v.position();
                Coord::new(pos.x, pos.y)
            });
            let tri = Triangle::new(p, q, r);
            if tri.area() > 0.0 && poly.contains(tri.centroid()) {
                triangles.push(tri);
            }
        }
        Self::from_triangles(triangles)
    }

    /// Build the sampler from precomputed triangles (zero-area ones are dropped).
    pub fn from_triangles(triangles: Vec<Triangle>) -> Result<Self> {
        let triangles: Vec<Triangle> = triangles.into_iter().filter(|t| t.area() > 0.0).collect();
        if triangles.is_empty() {
            return Err(GeoError::DegenerateTriangulation { region: None });
        }
        let mut acc = 0.0;
        let cumulative = triangles
            .iter()
            .map(|t| {
                acc += t.area();
                acc
            })
            .collect();
        Ok(Self {
            triangles,
            cumulative,
        })
    }

    #[inline]
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Sum of triangle areas.
    #[inline]
    pub fn area(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Pick a triangle with probability proportional to its area.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> &Triangle {
        let target = rng.gen::<f64>() * self.area();
        let idx = self
            .cumulative
            .partition_point(|c| *c <= target)
            .min(self.triangles.len() - 1);
        &self.triangles[idx]
    }

    /// Area-uniform point over the triangulated polygon.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Coord {
        self.pick(rng).sample(rng)
    }
}

fn insert_ring(cdt: &mut ConstrainedDelaunayTriangulation<Point2<f64>>, ring: &[Coord]) -> Result<()> {
    // Rings are stored closed; the closing vertex would only duplicate the first.
    let open = match ring.split_last() {
        Some((last, rest)) if Some(last) == rest.first() => rest,
        _ => ring,
    };
    let mut handles: Vec<FixedVertexHandle> = Vec::with_capacity(open.len());
    for p in open {
        let h = cdt
            .insert(Point2::new(p.x, p.y))
            .map_err(|_| GeoError::DegenerateTriangulation { region: None })?;
        handles.push(h);
    }
    for k in 0..handles.len() {
        let from = handles[k];
        let to = handles[(k + 1) % handles.len()];
        // Self-intersecting rings cannot be fully constrained; skipped segments only
        // loosen the fit and the centroid filter still keeps triangles inside.
        if from != to && cdt.can_add_constraint(from, to) {
            cdt.add_constraint(from, to);
        }
    }
    Ok(())
}
