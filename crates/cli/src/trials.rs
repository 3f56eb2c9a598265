//! Repeated-trial experiment: obfuscate the same network many times per strategy and
//! compare edge-length distributions against the original.
//!
//! Per run: optional boundary filter, a grid partition over what remains, then for each
//! trial one obfuscation per arm:
//! - `radius`: fixed-radius walk
//! - `tile`: uniform inside the node's grid cell
//! - `region`: uniform inside the caller's region holding the node, when regions are given
//! - `knn`: kNN radius, when `k` is given
//!
//! Strict failure policy throughout. Timings are wall-clock microseconds per trial and arm.

use std::time::Instant;

use anyhow::{Context, Result};
use geojitter::compare::{compare, CompareCfg, Comparison, Displacement};
use geojitter::engine::{obfuscate, ObfuscateCfg};
use geojitter::geom::Geometry;
use geojitter::network::{Network, XyExtractor};
use geojitter::partition::{filter_by_region, grid_partition, GridCfg};
use geojitter::region::{ContainmentResolver, RegionResolver, RegionSet};
use geojitter::strategy::Strategy;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

#[derive(Clone, Debug)]
pub struct TrialsCfg {
    pub grid: GridCfg,
    pub trials: usize,
    pub radius: f64,
    pub k: Option<usize>,
    pub seed: u64,
    pub granularity: usize,
    pub displacement: Displacement,
}

impl Default for TrialsCfg {
    fn default() -> Self {
        Self {
            grid: GridCfg::default(),
            trials: 10,
            radius: 0.5,
            k: None,
            seed: 0,
            granularity: 100,
            displacement: Displacement::Signed,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StrategyRow {
    pub strategy: &'static str,
    #[serde(flatten)]
    pub metrics: Comparison,
}

#[derive(Debug, Serialize)]
pub struct TrialTiming {
    pub trial: usize,
    pub overhead_us: u128,
    /// Arm name → microseconds, in run order.
    pub strategies: Vec<(&'static str, u128)>,
}

#[derive(Debug, Serialize)]
pub struct TrialsReport {
    pub nodes: usize,
    pub edges: usize,
    pub rows: Vec<StrategyRow>,
    pub timings: Vec<TrialTiming>,
}

/// One obfuscation setup compared across trials.
struct Arm<'a> {
    name: &'static str,
    strategy: Strategy,
    regions: &'a RegionSet,
    resolver: &'a dyn RegionResolver,
}

pub fn run_trials(
    network: &Network,
    boundary: Option<&Geometry>,
    regions: Option<&RegionSet>,
    cfg: &TrialsCfg,
) -> Result<TrialsReport> {
    anyhow::ensure!(cfg.trials > 0, "need at least one trial");
    let ex = XyExtractor::default();
    let mut rng = StdRng::seed_from_u64(cfg.seed);

    let setup = Instant::now();
    let focused = match boundary {
        Some(b) => filter_by_region(network, b, &ex).context("filtering by boundary")?,
        None => network.clone(),
    };
    let grid = grid_partition(&focused, &ex, &cfg.grid).context("building grid")?;
    let overhead_us = setup.elapsed().as_micros();
    tracing::info!(
        nodes = focused.node_count(),
        edges = focused.edge_count(),
        cells = grid.regions().len(),
        "prepared network"
    );

    if let Some(r) = regions {
        anyhow::ensure!(!r.is_empty(), "the region arm needs at least one region");
    }
    let empty = RegionSet::new();
    let by_containment = regions.map(|r| ContainmentResolver::new(r, &ex));
    let mut arms = vec![
        Arm {
            name: "radius",
            strategy: Strategy::fixed_radius(cfg.radius)?,
            regions: &empty,
            resolver: grid.assignment(),
        },
        Arm {
            name: "tile",
            strategy: Strategy::uniform(),
            regions: grid.regions(),
            resolver: grid.assignment(),
        },
    ];
    if let (Some(r), Some(resolver)) = (regions, by_containment.as_ref()) {
        arms.push(Arm {
            name: "region",
            strategy: Strategy::uniform(),
            regions: r,
            resolver,
        });
    }
    if let Some(k) = cfg.k {
        arms.push(Arm {
            name: "knn",
            strategy: Strategy::knn(&focused, &ex, k)?,
            regions: &empty,
            resolver: grid.assignment(),
        });
    }

    let obf_cfg = ObfuscateCfg::strict();
    let mut outputs: Vec<Vec<Network>> = vec![Vec::with_capacity(cfg.trials); arms.len()];
    let mut timings = Vec::with_capacity(cfg.trials);
    for trial in 0..cfg.trials {
        let mut per_arm = Vec::with_capacity(arms.len());
        for (arm, out) in arms.iter().zip(outputs.iter_mut()) {
            let start = Instant::now();
            let result = obfuscate(
                &focused,
                arm.regions,
                arm.resolver,
                &ex,
                &arm.strategy,
                &obf_cfg,
                &mut rng,
            )
            .with_context(|| format!("trial {trial}, arm {}", arm.name))?;
            per_arm.push((arm.name, start.elapsed().as_micros()));
            out.push(result.network);
        }
        timings.push(TrialTiming {
            trial,
            // Setup runs once; it is charged to the first trial.
            overhead_us: if trial == 0 { overhead_us } else { 0 },
            strategies: per_arm,
        });
    }

    let cmp_cfg = CompareCfg {
        granularity: cfg.granularity,
        displacement: cfg.displacement,
    };
    let rows = arms
        .iter()
        .zip(&outputs)
        .map(|(arm, trials)| {
            let metrics = compare(&focused, trials, &ex, &cmp_cfg)
                .with_context(|| format!("comparing {}", arm.name))?;
            tracing::info!(
                arm = arm.name,
                strategy = arm.strategy.name(),
                wasserstein = metrics.wasserstein,
                ks = metrics.ks,
                "compared"
            );
            Ok(StrategyRow {
                strategy: arm.name,
                metrics,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(TrialsReport {
        nodes: focused.node_count(),
        edges: focused.edge_count(),
        rows,
        timings,
    })
}
