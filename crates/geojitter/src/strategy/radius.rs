//! Radius walks: fixed radius and k-nearest-neighbor adaptive radius.
//!
//! A walk moves the origin to a point uniform over the disc of radius `ρ` around it:
//! `r = ρ·√U`, `θ = 2π·U'`. The square root makes the density uniform in area rather
//! than in radius. The region is never consulted, so walked points may leave it.

use std::f64::consts::TAU;

use rand::Rng;

use crate::error::{GeoError, Result};
use crate::geom::{is_finite, Coord};
use crate::network::{CoordExtractor, Network};

/// Uniform point in the disc of `radius` around `origin`.
pub fn walk<R: Rng + ?Sized>(origin: Coord, radius: f64, rng: &mut R) -> Coord {
    let r = radius * rng.gen::<f64>().sqrt();
    let theta = TAU * rng.gen::<f64>();
    origin + Coord::new(r * theta.cos(), r * theta.sin())
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedRadius {
    radius: f64,
}

impl FixedRadius {
    /// `radius` must be finite and non-negative; zero leaves every point in place.
    pub fn new(radius: f64) -> Result<Self> {
        if !radius.is_finite() || radius < 0.0 {
            return Err(GeoError::invalid(format!(
                "radius must be finite and >= 0, got {radius}"
            )));
        }
        Ok(Self { radius })
    }

    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn walk<R: Rng + ?Sized>(&self, origin: Coord, rng: &mut R) -> Coord {
        walk(origin, self.radius, rng)
    }
}

/// Walk whose radius is the distance to the k-th nearest reference point.
///
/// Invariants: `k >= 1` and at least `k` finite reference points. A reference point
/// coincident with the query counts as a neighbor at distance zero.
#[derive(Clone, Debug, PartialEq)]
pub struct KnnRadius {
    points: Vec<Coord>,
    k: usize,
}

impl KnnRadius {
    /// Reference points are the located nodes of `reference`.
    pub fn new<E>(reference: &Network, extractor: &E, k: usize) -> Result<Self>
    where
        E: CoordExtractor + ?Sized,
    {
        Self::from_points(reference.coords(extractor).map(|(_, c)| c).collect(), k)
    }

    pub fn from_points(points: Vec<Coord>, k: usize) -> Result<Self> {
        if k < 1 {
            return Err(GeoError::invalid("k must be at least 1"));
        }
        let points: Vec<Coord> = points.into_iter().filter(|p| is_finite(*p)).collect();
        if points.len() < k {
            return Err(GeoError::invalid(format!(
                "k = {k} exceeds the {} located reference nodes",
                points.len()
            )));
        }
        Ok(Self { points, k })
    }

    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Distance from `query` to its k-th nearest reference point.
    ///
    /// Linear scan keeping the k smallest distances sorted.
    pub fn radius_at(&self, query: Coord) -> f64 {
        let k = self.k;
        let mut best: Vec<f64> = Vec::with_capacity(k + 1);
        for p in &self.points {
            let d = (p - query).norm();
            if best.len() == k && d >= best[k - 1] {
                continue;
            }
            let at = best.partition_point(|x| *x <= d);
            best.insert(at, d);
            best.truncate(k);
        }
        best.last().copied().unwrap_or(0.0)
    }

    pub fn walk<R: Rng + ?Sized>(&self, origin: Coord, rng: &mut R) -> Coord {
        walk(origin, self.radius_at(origin), rng)
    }
}
