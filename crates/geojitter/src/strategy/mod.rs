//! Perturbation strategies.
//!
//! Purpose
//! - Map an old coordinate (and, for region-bound strategies, its region) to a new
//!   coordinate, or report that none was found.
//!
//! Model
//! - `Strategy` is a closed set dispatched by `match`:
//!   - `UniformInRegion`: area-uniform point inside the region (rejection, then a
//!     triangulation fallback). Guarantees containment.
//!   - `FixedRadius`: isotropic walk with a fixed radius. Ignores the region.
//!   - `KnnRadius`: isotropic walk whose radius is the distance to the k-th nearest node
//!     of a reference network. Ignores the region.
//! - "No point found" is a `SampleOutcome`, not an error; errors are reserved for
//!   problems no retry can fix (wrong geometry kind, degenerate triangulation).
//!
//! Randomness is always the caller's generator; strategies hold no RNG state.

mod radius;
mod uniform;

pub use radius::{walk, FixedRadius, KnnRadius};
pub use uniform::{sample_uniform, sample_uniform_cached, FallbackCache, UniformCfg};

use rand::Rng;

use crate::error::{GeoError, Result};
use crate::geom::{Coord, Geometry};
use crate::network::{CoordExtractor, Network};
use crate::region::RegionKey;

/// Result of one sampling call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SampleOutcome {
    Found(Coord),
    NotFound,
}

impl SampleOutcome {
    #[inline]
    pub fn point(self) -> Option<Coord> {
        match self {
            SampleOutcome::Found(p) => Some(p),
            SampleOutcome::NotFound => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Strategy {
    UniformInRegion(UniformCfg),
    FixedRadius(FixedRadius),
    KnnRadius(KnnRadius),
}

impl Strategy {
    /// Uniform-in-region with default settings (50 rejection draws, fallback on).
    pub fn uniform() -> Self {
        Strategy::UniformInRegion(UniformCfg::default())
    }

    pub fn uniform_with(cfg: UniformCfg) -> Result<Self> {
        cfg.validate()?;
        Ok(Strategy::UniformInRegion(cfg))
    }

    pub fn fixed_radius(radius: f64) -> Result<Self> {
        FixedRadius::new(radius).map(Strategy::FixedRadius)
    }

    pub fn knn<E>(reference: &Network, extractor: &E, k: usize) -> Result<Self>
    where
        E: CoordExtractor + ?Sized,
    {
        KnnRadius::new(reference, extractor, k).map(Strategy::KnnRadius)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::UniformInRegion(_) => "uniform",
            Strategy::FixedRadius(_) => "radius",
            Strategy::KnnRadius(_) => "knn",
        }
    }

    /// Whether `sample` reads the region.
    pub fn needs_region(&self) -> bool {
        matches!(self, Strategy::UniformInRegion(_))
    }

    /// Whether `sample` reads the old coordinate.
    pub fn uses_origin(&self) -> bool {
        !self.needs_region()
    }

    pub fn sample<R: Rng + ?Sized>(
        &self,
        old: Coord,
        region: Option<&Geometry>,
        rng: &mut R,
    ) -> Result<SampleOutcome> {
        match self {
            Strategy::UniformInRegion(cfg) => {
                let region = region
                    .ok_or_else(|| GeoError::invalid("uniform sampling needs a region"))?;
                sample_uniform(cfg, region, rng)
            }
            Strategy::FixedRadius(s) => Ok(SampleOutcome::Found(s.walk(old, rng))),
            Strategy::KnnRadius(s) => Ok(SampleOutcome::Found(s.walk(old, rng))),
        }
    }

    /// `sample` for a keyed region, keeping fallback triangulations in `cache`.
    pub fn sample_cached<R: Rng + ?Sized>(
        &self,
        old: Coord,
        region: Option<(&RegionKey, &Geometry)>,
        cache: &mut FallbackCache,
        rng: &mut R,
    ) -> Result<SampleOutcome> {
        match (self, region) {
            (Strategy::UniformInRegion(cfg), Some((key, geometry))) => {
                sample_uniform_cached(cfg, geometry, Some((cache, key)), rng)
            }
            (_, region) => self.sample(old, region.map(|(_, g)| g), rng),
        }
    }
}
