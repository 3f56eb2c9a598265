//! Obfuscation engine: move every node of a network with one strategy.
//!
//! Purpose
//! - Produce a copy of a network whose node coordinates were rewritten by a
//!   `Strategy`, with node ids, edges and every non-coordinate attribute untouched.
//!
//! Model
//! - Nodes are visited in id order. Per node: read the coordinate (radius strategies),
//!   resolve the region (uniform strategy), sample, write back `x`/`y`.
//! - Each node draws from its own `StdRng` derived from `(seed, node index)` via a
//!   replay token, so a node's draw depends only on the seed and its position.
//! - Failure policy:
//!   - graceful (default): the node gets the sentinel coordinate `(0, 0)`, a warning is
//!     logged and the failure is recorded in `Obfuscated::failures`;
//!   - strict: the first failure aborts with `GeoError::NodeFailed`.
//!   Fatal errors (wrong geometry kind, degenerate triangulation) abort under both.
//!
//! The input network is never mutated.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::error::{FailureKind, GeoError, Result};
use crate::geom::{is_finite, Coord};
use crate::network::{CoordExtractor, Network, NodeId};
use crate::region::{RegionKey, RegionResolver, RegionSet};
use crate::strategy::{FallbackCache, SampleOutcome, Strategy};

/// Replay token: reproducible per-item generator from a base seed and an index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplayToken {
    pub seed: u64,
    pub index: u64,
}

impl ReplayToken {
    #[inline]
    pub fn new(seed: u64, index: u64) -> Self {
        Self { seed, index }
    }

    #[inline]
    pub fn to_std_rng(self) -> StdRng {
        // SplitMix64 finalizer.
        fn mix(mut x: u64) -> u64 {
            x ^= x >> 30;
            x = x.wrapping_mul(0xbf58476d1ce4e5b9);
            x ^= x >> 27;
            x = x.wrapping_mul(0x94d049bb133111eb);
            x ^ (x >> 31)
        }
        let k = mix(self.seed ^ mix(self.index.wrapping_add(0x9e3779b97f4a7c15)));
        StdRng::seed_from_u64(k)
    }
}

/// Engine configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct ObfuscateCfg {
    /// Record failures and continue (true) or abort on the first one (false).
    pub fail_graceful: bool,
    pub x_key: String,
    pub y_key: String,
    /// When set, the resolved region key is written to this node attribute.
    pub region_key: Option<String>,
    /// Base seed for the per-node generators. `None` draws one from the caller's RNG.
    pub seed: Option<u64>,
    /// Coordinate given to nodes that fail under the graceful policy.
    pub sentinel: Coord,
}

impl Default for ObfuscateCfg {
    fn default() -> Self {
        Self {
            fail_graceful: true,
            x_key: "x".to_string(),
            y_key: "y".to_string(),
            region_key: None,
            seed: None,
            sentinel: Coord::zeros(),
        }
    }
}

impl ObfuscateCfg {
    pub fn strict() -> Self {
        Self {
            fail_graceful: false,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.x_key.is_empty() || self.y_key.is_empty() {
            return Err(GeoError::invalid("coordinate attribute keys must be non-empty"));
        }
        if self.x_key == self.y_key {
            return Err(GeoError::invalid("x_key and y_key must differ"));
        }
        if !is_finite(self.sentinel) {
            return Err(GeoError::invalid("sentinel coordinate must be finite"));
        }
        Ok(())
    }
}

/// A node the engine could not place (graceful policy only).
#[derive(Clone, Debug, PartialEq)]
pub struct NodeFailure {
    pub node: NodeId,
    pub kind: FailureKind,
}

#[derive(Clone, Debug)]
pub struct Obfuscated {
    pub network: Network,
    /// Empty under the strict policy.
    pub failures: Vec<NodeFailure>,
    /// Base seed actually used; feed it back through `ObfuscateCfg::seed` to replay.
    pub seed: u64,
}

/// Obfuscate every node of `network`.
///
/// - `regions` + `resolver` supply each node's region (only read by strategies that
///   need one, or when `cfg.region_key` asks for tagging).
/// - `extractor` reads the current coordinate (only required by radius strategies).
/// - `rng` is consulted once, for the base seed, and only if `cfg.seed` is `None`.
pub fn obfuscate<R, G, E>(
    network: &Network,
    regions: &RegionSet,
    resolver: &G,
    extractor: &E,
    strategy: &Strategy,
    cfg: &ObfuscateCfg,
    rng: &mut R,
) -> Result<Obfuscated>
where
    R: Rng + ?Sized,
    G: RegionResolver + ?Sized,
    E: CoordExtractor + ?Sized,
{
    cfg.validate()?;
    let seed = cfg.seed.unwrap_or_else(|| rng.gen());
    debug!(seed, strategy = strategy.name(), nodes = network.node_count(), "obfuscating");

    let mut out = network.clone();
    let mut failures = Vec::new();
    let resolve = strategy.needs_region() || cfg.region_key.is_some();
    let mut cache = FallbackCache::new();

    for (index, (id, attrs)) in network.nodes().enumerate() {
        let mut node_rng = ReplayToken::new(seed, index as u64).to_std_rng();
        let region = if resolve {
            resolver.resolve(id, attrs)
        } else {
            None
        };
        let old = extractor.extract(id, attrs).filter(|c| is_finite(*c));

        match place(strategy, regions, region.as_ref(), old, &mut cache, &mut node_rng)? {
            Ok(p) => out.set_coord(id, p, &cfg.x_key, &cfg.y_key)?,
            Err(kind) => {
                if !cfg.fail_graceful {
                    return Err(GeoError::NodeFailed {
                        node: id.clone(),
                        kind,
                    });
                }
                warn!(node = %id, reason = %kind, "unable to obfuscate node, using sentinel");
                out.set_coord(id, cfg.sentinel, &cfg.x_key, &cfg.y_key)?;
                failures.push(NodeFailure {
                    node: id.clone(),
                    kind,
                });
            }
        }

        if let (Some(key), Some(region)) = (&cfg.region_key, &region) {
            out.set_attr(id, key, region.to_attr())?;
        }
    }

    info!(
        strategy = strategy.name(),
        nodes = network.node_count(),
        failed = failures.len(),
        triangulated = cache.len(),
        "obfuscation done"
    );
    Ok(Obfuscated {
        network: out,
        failures,
        seed,
    })
}

/// Place one node. The outer `Result` carries fatal errors, the inner one per-node
/// failures that the policy decides about.
fn place<R: Rng + ?Sized>(
    strategy: &Strategy,
    regions: &RegionSet,
    region: Option<&RegionKey>,
    old: Option<Coord>,
    cache: &mut FallbackCache,
    rng: &mut R,
) -> Result<std::result::Result<Coord, FailureKind>> {
    let origin = match (strategy.uses_origin(), old) {
        (true, None) => return Ok(Err(FailureKind::MissingCoordinate)),
        (_, old) => old.unwrap_or_else(Coord::zeros),
    };
    let geometry = if strategy.needs_region() {
        let Some(key) = region else {
            return Ok(Err(FailureKind::MissingRegion));
        };
        let Some(g) = regions.get(key) else {
            return Ok(Err(FailureKind::UnknownRegion(key.clone())));
        };
        Some((key, g))
    } else {
        None
    };

    let outcome = strategy
        .sample_cached(origin, geometry, cache, rng)
        .map_err(|e| match region {
            Some(key) => e.in_region(key),
            None => e,
        })?;
    Ok(match outcome {
        SampleOutcome::Found(p) => Ok(p),
        SampleOutcome::NotFound => Err(FailureKind::NoPointFound),
    })
}
