use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use geojitter::compare::Displacement;
use geojitter::engine::{obfuscate, ObfuscateCfg};
use geojitter::geom::Geometry;
use geojitter::network::{Network, XyExtractor};
use geojitter::partition::GridCfg;
use geojitter::region::{AttributeResolver, ContainmentResolver, RegionResolver, RegionSet};
use geojitter::strategy::{Strategy, UniformCfg};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::fmt::SubscriberBuilder;

mod io;
mod provenance;
mod trials;

use provenance::{write_sidecar, Payload};

#[derive(Parser)]
#[command(name = "geojitter")]
#[command(about = "Obfuscate node coordinates of spatial networks and measure the distortion")]
struct Cmd {
    /// Log per-node failures and sampling fallbacks
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    action: Action,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StrategyArg {
    Uniform,
    Radius,
    Knn,
}

#[derive(Subcommand)]
enum Action {
    /// Obfuscate one network and write it with a provenance sidecar
    Obfuscate {
        #[arg(long)]
        network: PathBuf,
        /// Regions JSON; required by the uniform strategy
        #[arg(long)]
        regions: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = StrategyArg::Uniform)]
        strategy: StrategyArg,
        #[arg(long, default_value_t = 0.5)]
        radius: f64,
        #[arg(long, default_value_t = 5)]
        k: usize,
        #[arg(long, default_value_t = 50)]
        max_iter: usize,
        /// Disable the triangulation fallback (pure rejection sampling)
        #[arg(long)]
        no_fallback: bool,
        /// Read region keys from this node attribute instead of testing containment
        #[arg(long)]
        region_attr: Option<String>,
        /// Write the resolved region key to this node attribute
        #[arg(long)]
        tag: Option<String>,
        #[arg(long)]
        seed: Option<u64>,
        /// Abort on the first node that cannot be placed
        #[arg(long)]
        strict: bool,
        #[arg(long)]
        out: PathBuf,
    },
    /// Repeated trials per strategy over a grid partition; writes metric rows
    Trials {
        #[arg(long)]
        network: PathBuf,
        /// Boundary geometry JSON; nodes outside it (and orphans) are dropped first
        #[arg(long)]
        boundary: Option<PathBuf>,
        /// Regions JSON (e.g. counties); adds a uniform-in-region arm resolved by containment
        #[arg(long)]
        regions: Option<PathBuf>,
        #[arg(long, default_value_t = 10)]
        rows: usize,
        #[arg(long, default_value_t = 10)]
        cols: usize,
        #[arg(long, default_value_t = 0.1)]
        buffer: f64,
        #[arg(long, default_value_t = 10)]
        trials: usize,
        #[arg(long, default_value_t = 0.5)]
        radius: f64,
        /// Also run the kNN-radius strategy with this k
        #[arg(long)]
        k: Option<usize>,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long, default_value_t = 100)]
        granularity: usize,
        /// Summarize |relative change| instead of signed change
        #[arg(long)]
        absolute: bool,
        #[arg(long)]
        out: PathBuf,
    },
    /// Print a small provenance JSON block
    Report,
}

fn main() -> Result<()> {
    let cmd = Cmd::parse();
    let level = if cmd.verbose { Level::DEBUG } else { Level::INFO };
    SubscriberBuilder::default()
        .with_target(false)
        .with_max_level(level)
        .init();
    match cmd.action {
        Action::Obfuscate {
            network,
            regions,
            strategy,
            radius,
            k,
            max_iter,
            no_fallback,
            region_attr,
            tag,
            seed,
            strict,
            out,
        } => {
            let opts = ObfuscateOpts {
                strategy,
                radius,
                k,
                uniform: UniformCfg {
                    max_iter,
                    fallback: !no_fallback,
                    ..UniformCfg::default()
                },
                region_attr,
                tag,
                seed,
                strict,
            };
            run_obfuscate(&network, regions.as_deref(), &opts, &out)
        }
        Action::Trials {
            network,
            boundary,
            regions,
            rows,
            cols,
            buffer,
            trials,
            radius,
            k,
            seed,
            granularity,
            absolute,
            out,
        } => {
            let cfg = trials::TrialsCfg {
                grid: GridCfg { rows, cols, buffer },
                trials,
                radius,
                k,
                seed,
                granularity,
                displacement: if absolute {
                    Displacement::Absolute
                } else {
                    Displacement::Signed
                },
            };
            run_trials(&network, boundary.as_deref(), regions.as_deref(), &cfg, &out)
        }
        Action::Report => report(),
    }
}

struct ObfuscateOpts {
    strategy: StrategyArg,
    radius: f64,
    k: usize,
    uniform: UniformCfg,
    region_attr: Option<String>,
    tag: Option<String>,
    seed: Option<u64>,
    strict: bool,
}

fn run_obfuscate(network_path: &Path, regions_path: Option<&Path>, opts: &ObfuscateOpts, out: &Path) -> Result<()> {
    tracing::info!(network = %network_path.display(), strategy = ?opts.strategy, "obfuscate");
    let net: Network = io::read_json(network_path)?;
    let regions = match regions_path {
        Some(p) => io::load_regions(p)?,
        None => RegionSet::new(),
    };
    let ex = XyExtractor::default();
    let strategy = match opts.strategy {
        StrategyArg::Uniform => {
            anyhow::ensure!(!regions.is_empty(), "the uniform strategy needs --regions");
            Strategy::uniform_with(opts.uniform)?
        }
        StrategyArg::Radius => Strategy::fixed_radius(opts.radius)?,
        StrategyArg::Knn => Strategy::knn(&net, &ex, opts.k)?,
    };

    let by_attr;
    let by_containment;
    let resolver: &dyn RegionResolver = match &opts.region_attr {
        Some(key) => {
            by_attr = AttributeResolver::new(key.clone());
            &by_attr
        }
        None => {
            by_containment = ContainmentResolver::new(&regions, &ex);
            &by_containment
        }
    };

    let cfg = ObfuscateCfg {
        fail_graceful: !opts.strict,
        region_key: opts.tag.clone(),
        seed: opts.seed,
        ..ObfuscateCfg::default()
    };
    let mut rng = StdRng::from_entropy();
    let result = obfuscate(&net, &regions, resolver, &ex, &strategy, &cfg, &mut rng)
        .context("obfuscating network")?;
    io::write_json(out, &result.network)?;

    let mut inputs = vec![network_path.display().to_string()];
    if let Some(p) = regions_path {
        inputs.push(p.display().to_string());
    }
    let payload = Payload::new(
        "obfuscate",
        serde_json::json!({
            "strategy": strategy.name(),
            "radius": opts.radius,
            "k": opts.k,
            "max_iter": opts.uniform.max_iter,
            "fallback": opts.uniform.fallback,
            "strict": opts.strict,
            "failures": result.failures.len(),
        }),
    )
    .with_seed(result.seed)
    .with_inputs(inputs);
    let prov = write_sidecar(out, payload)?;
    tracing::info!(out = %out.display(), provenance = %prov.display(), "wrote obfuscated network");
    Ok(())
}

fn run_trials(
    network_path: &Path,
    boundary_path: Option<&Path>,
    regions_path: Option<&Path>,
    cfg: &trials::TrialsCfg,
    out: &Path,
) -> Result<()> {
    tracing::info!(network = %network_path.display(), trials = cfg.trials, "trials");
    let net: Network = io::read_json(network_path)?;
    let boundary: Option<Geometry> = boundary_path.map(io::read_json::<Geometry>).transpose()?;
    let regions = regions_path.map(io::load_regions).transpose()?;
    let report = trials::run_trials(&net, boundary.as_ref(), regions.as_ref(), cfg)?;
    io::write_json(out, &report)?;

    let mut inputs = vec![network_path.display().to_string()];
    inputs.extend(
        boundary_path
            .into_iter()
            .chain(regions_path)
            .map(|p| p.display().to_string()),
    );
    let payload = Payload::new(
        "trials",
        serde_json::json!({
            "rows": cfg.grid.rows,
            "cols": cfg.grid.cols,
            "buffer": cfg.grid.buffer,
            "trials": cfg.trials,
            "radius": cfg.radius,
            "k": cfg.k,
            "granularity": cfg.granularity,
            "displacement": cfg.displacement,
            "region_arm": regions_path.is_some(),
        }),
    )
    .with_seed(cfg.seed)
    .with_inputs(inputs);
    write_sidecar(out, payload)?;
    Ok(())
}

fn report() -> Result<()> {
    let mut obj = provenance::base_document();
    obj["params"] = serde_json::json!({});
    obj["outputs"] = serde_json::json!([]);
    println!("{}", serde_json::to_string_pretty(&obj)?);
    Ok(())
}
