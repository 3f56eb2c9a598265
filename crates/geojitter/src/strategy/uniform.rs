//! Uniform-in-region sampling.
//!
//! Model
//! - Multipolygon: pick one constituent polygon uniformly at random (not area
//!   weighted; small islands are over-represented).
//! - Rejection: up to `max_iter` uniform draws in the polygon's bounding box; the first
//!   contained draw wins.
//! - Fallback: triangulate the polygon and draw area-weighted barycentric points. A draw
//!   that the containment test rejects (it landed on a top/right edge after rounding) is
//!   re-drawn up to `fallback_redraws` times.
//! - Fallback triangulations can be kept in a `FallbackCache` keyed by region and part,
//!   so nodes sharing a thin region build the triangulation once per run.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use rand::Rng;
use tracing::debug;

use super::SampleOutcome;
use crate::error::{GeoError, Result};
use crate::geom::{Coord, Geometry, Polygon, Triangulated};
use crate::region::RegionKey;

/// Uniform sampler configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UniformCfg {
    /// Rejection draws in the bounding box before giving up or falling back.
    pub max_iter: usize,
    /// Triangulate on rejection exhaustion. Off reproduces pure rejection sampling.
    pub fallback: bool,
    /// Fallback draws allowed to miss the containment test.
    pub fallback_redraws: usize,
}

impl Default for UniformCfg {
    fn default() -> Self {
        Self {
            max_iter: 50,
            fallback: true,
            fallback_redraws: 8,
        }
    }
}

impl UniformCfg {
    pub fn validate(&self) -> Result<()> {
        if self.max_iter == 0 && !self.fallback {
            return Err(GeoError::invalid(
                "max_iter must be at least 1 when the triangulation fallback is off",
            ));
        }
        if self.fallback && self.fallback_redraws == 0 {
            return Err(GeoError::invalid("fallback_redraws must be at least 1"));
        }
        Ok(())
    }
}

/// Fallback triangulations by `(region, part index)`. Only valid while the region set
/// it was filled from is unchanged.
#[derive(Debug, Default)]
pub struct FallbackCache {
    built: HashMap<(RegionKey, usize), Triangulated>,
}

impl FallbackCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Triangulations built so far.
    pub fn len(&self) -> usize {
        self.built.len()
    }

    pub fn is_empty(&self) -> bool {
        self.built.is_empty()
    }

    fn get_or_build(&mut self, key: &RegionKey, part_index: usize, part: &Polygon) -> Result<&Triangulated> {
        match self.built.entry((key.clone(), part_index)) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(e) => Ok(e.insert(Triangulated::of_polygon(part)?)),
        }
    }
}

/// Draw a point inside `region`.
///
/// Errors: `InvalidGeometryKind` for regions without area, `DegenerateTriangulation`
/// when the fallback finds nothing to sample from. Neither is a "no point found"
/// outcome.
pub fn sample_uniform<R: Rng + ?Sized>(
    cfg: &UniformCfg,
    region: &Geometry,
    rng: &mut R,
) -> Result<SampleOutcome> {
    sample_uniform_cached(cfg, region, None, rng)
}

/// `sample_uniform`, reusing the fallback triangulation of `key` from `cache`.
pub fn sample_uniform_cached<R: Rng + ?Sized>(
    cfg: &UniformCfg,
    region: &Geometry,
    cache: Option<(&mut FallbackCache, &RegionKey)>,
    rng: &mut R,
) -> Result<SampleOutcome> {
    let parts = region.areal_parts()?;
    let part_index = rng.gen_range(0..parts.len());
    let part = &parts[part_index];

    if let Some(p) = rejection(part, cfg.max_iter, rng) {
        return Ok(SampleOutcome::Found(p));
    }
    if !cfg.fallback {
        debug!(max_iter = cfg.max_iter, "rejection sampling exhausted");
        return Ok(SampleOutcome::NotFound);
    }

    debug!(
        max_iter = cfg.max_iter,
        "rejection sampling exhausted, falling back to triangulation"
    );
    let fresh;
    let tri = match cache {
        Some((cache, key)) => cache.get_or_build(key, part_index, part)?,
        None => {
            fresh = Triangulated::of_polygon(part)?;
            &fresh
        }
    };
    for _ in 0..cfg.fallback_redraws {
        let p = tri.sample(rng);
        if part.contains(p) {
            return Ok(SampleOutcome::Found(p));
        }
    }
    Ok(SampleOutcome::NotFound)
}

fn rejection<R: Rng + ?Sized>(poly: &Polygon, max_iter: usize, rng: &mut R) -> Option<Coord> {
    let b = poly.bounds();
    (0..max_iter)
        .map(|_| {
            Coord::new(
                b.min.x + rng.gen::<f64>() * b.width(),
                b.min.y + rng.gen::<f64>() * b.height(),
            )
        })
        .find(|p| poly.contains(*p))
}
