//! Edge-length distribution comparison between a network and its obfuscated trials.
//!
//! Purpose
//! - Quantify how much obfuscation distorted a network's geometry, so strategies can be
//!   ranked by utility loss.
//!
//! Metrics
//! - Wasserstein-1 (earth mover's) distance `∫|F_u − F_v| dx` between the original edge
//!   lengths and the pooled lengths of all trials.
//! - Kolmogorov–Smirnov statistic `sup |F_o − F_p|`, evaluated on `n · granularity`
//!   equally spaced points over the joint range plus every sample value, where `n` is
//!   the original sample size. The mean `|F_o − F_p|` over the equally spaced points is
//!   reported as the CDF area.
//! - Relative displacement per edge, `(mean_after − before) / before` (signed) or its
//!   absolute value, summarized by midpoint-interpolated quartiles. Zero-length
//!   original edges cannot be normalized and are skipped; with none left the quartiles
//!   are absent while the distribution metrics are still reported.
//!
//! Edges are aligned by endpoint ids; a trial missing an original edge is an error.
//! Empirical CDFs count elements `<= x` by binary search over a sorted sample.

use serde::{Deserialize, Serialize};

use crate::error::{GeoError, Result};
use crate::network::{CoordExtractor, EdgeKey, Network, NodeId};

/// Euclidean edge lengths in edge order.
pub fn edge_lengths<E>(network: &Network, extractor: &E) -> Result<Vec<f64>>
where
    E: CoordExtractor + ?Sized,
{
    network
        .edges()
        .map(|(k, _)| edge_length(network, k, extractor))
        .collect()
}

fn edge_length<E>(network: &Network, key: &EdgeKey, extractor: &E) -> Result<f64>
where
    E: CoordExtractor + ?Sized,
{
    let (a, b) = key.endpoints();
    let at = |id: &NodeId| {
        network
            .node(id)
            .and_then(|attrs| extractor.extract(id, attrs))
            .ok_or_else(|| GeoError::MissingCoordinate(id.clone()))
    };
    Ok((at(a)? - at(b)?).norm())
}

/// Lengths in `trial` of the edges of `before`, in `before`'s edge order.
pub fn aligned_lengths<E>(before: &Network, trial: &Network, extractor: &E) -> Result<Vec<f64>>
where
    E: CoordExtractor + ?Sized,
{
    before
        .edges()
        .map(|(k, _)| {
            let (a, b) = k.endpoints();
            if !trial.has_edge(a, b) {
                return Err(GeoError::MissingEdge {
                    a: a.clone(),
                    b: b.clone(),
                });
            }
            edge_length(trial, k, extractor)
        })
        .collect()
}

/// Per-edge mean length across trials, aligned with `before`'s edge order.
pub fn mean_trial_lengths<E>(before: &Network, trials: &[Network], extractor: &E) -> Result<Vec<f64>>
where
    E: CoordExtractor + ?Sized,
{
    let per_trial = trials
        .iter()
        .map(|t| aligned_lengths(before, t, extractor))
        .collect::<Result<Vec<_>>>()?;
    column_means(&per_trial, before.edge_count())
}

fn column_means(rows: &[Vec<f64>], width: usize) -> Result<Vec<f64>> {
    if rows.is_empty() {
        return Err(GeoError::Empty { what: "trials" });
    }
    let mut sums = vec![0.0; width];
    for row in rows {
        if row.len() != width {
            return Err(GeoError::invalid(format!(
                "trial has {} edge lengths, expected {width}",
                row.len()
            )));
        }
        for (s, x) in sums.iter_mut().zip(row) {
            *s += x;
        }
    }
    let n = rows.len() as f64;
    Ok(sums.into_iter().map(|s| s / n).collect())
}

fn sorted_sample(xs: &[f64], what: &'static str) -> Result<Vec<f64>> {
    if xs.is_empty() {
        return Err(GeoError::Empty { what });
    }
    if let Some(bad) = xs.iter().find(|x| !x.is_finite()) {
        return Err(GeoError::invalid(format!("{what} contains non-finite value {bad}")));
    }
    let mut v = xs.to_vec();
    v.sort_by(f64::total_cmp);
    Ok(v)
}

/// Empirical CDF of a sorted sample at `x` (fraction of elements `<= x`).
#[inline]
fn ecdf(sorted: &[f64], x: f64) -> f64 {
    sorted.partition_point(|y| *y <= x) as f64 / sorted.len() as f64
}

fn pooled(trials: &[Vec<f64>]) -> Vec<f64> {
    trials.iter().flatten().copied().collect()
}

/// 1-D Wasserstein-1 distance between two samples.
pub fn wasserstein_1d(u: &[f64], v: &[f64]) -> Result<f64> {
    let u = sorted_sample(u, "first sample")?;
    let v = sorted_sample(v, "second sample")?;
    let mut all: Vec<f64> = u.iter().chain(v.iter()).copied().collect();
    all.sort_by(f64::total_cmp);
    Ok(all
        .windows(2)
        .map(|w| (ecdf(&u, w[0]) - ecdf(&v, w[0])).abs() * (w[1] - w[0]))
        .sum())
}

/// Wasserstein distance between `before` and the pooled trial lengths.
pub fn wasserstein(before: &[f64], trials: &[Vec<f64>]) -> Result<f64> {
    if trials.is_empty() {
        return Err(GeoError::Empty { what: "trials" });
    }
    wasserstein_1d(before, &pooled(trials))
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct KsResult {
    /// Supremum of `|F_original − F_perturbed|`.
    pub statistic: f64,
    /// Mean `|F_original − F_perturbed|` over the evaluation grid.
    pub cdf_area: f64,
}

/// Evaluation grid: `count` equally spaced points from `lo` to `hi` inclusive.
fn linspace(lo: f64, hi: f64, count: usize) -> impl Iterator<Item = f64> {
    let last = count.saturating_sub(1).max(1) as f64;
    (0..count).map(move |i| {
        if i + 1 == count {
            hi
        } else {
            lo + (hi - lo) * i as f64 / last
        }
    })
}

/// Two-sample KS statistic with the CDF area over an `n · granularity` grid.
pub fn ks_statistic(original: &[f64], perturbed: &[f64], granularity: usize) -> Result<KsResult> {
    if granularity == 0 {
        return Err(GeoError::invalid("granularity must be at least 1"));
    }
    let o = sorted_sample(original, "original sample")?;
    let p = sorted_sample(perturbed, "perturbed sample")?;
    let lo = o[0].min(p[0]);
    let hi = o[o.len() - 1].max(p[p.len() - 1]);
    let count = o.len() * granularity;

    let gap = |x: f64| (ecdf(&o, x) - ecdf(&p, x)).abs();
    let mut statistic = 0.0_f64;
    let mut total = 0.0;
    for x in linspace(lo, hi, count) {
        let d = gap(x);
        total += d;
        statistic = statistic.max(d);
    }
    // The step functions only jump at sample values; including them makes the sup exact.
    for &x in o.iter().chain(p.iter()) {
        statistic = statistic.max(gap(x));
    }
    Ok(KsResult {
        statistic,
        cdf_area: total / count as f64,
    })
}

/// KS comparison of `before` against the pooled trial lengths.
pub fn kolmogorov_smirnov(before: &[f64], trials: &[Vec<f64>], granularity: usize) -> Result<KsResult> {
    if trials.is_empty() {
        return Err(GeoError::Empty { what: "trials" });
    }
    ks_statistic(before, &pooled(trials), granularity)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Displacement {
    #[default]
    Signed,
    Absolute,
}

/// Relative change per edge; zero-length original edges are skipped.
pub fn relative_displacement(before: &[f64], mean_after: &[f64], mode: Displacement) -> Result<Vec<f64>> {
    if before.len() != mean_after.len() {
        return Err(GeoError::invalid(format!(
            "{} original lengths but {} trial means",
            before.len(),
            mean_after.len()
        )));
    }
    Ok(before
        .iter()
        .zip(mean_after)
        .filter(|(b, _)| **b != 0.0)
        .map(|(b, a)| {
            let rel = (a - b) / b;
            match mode {
                Displacement::Signed => rel,
                Displacement::Absolute => rel.abs(),
            }
        })
        .collect())
}

/// Five-number summary at percentiles 0/25/50/75/100.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quartiles {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl Quartiles {
    pub fn as_array(&self) -> [f64; 5] {
        [self.min, self.q1, self.median, self.q3, self.max]
    }
}

/// Quartiles with midpoint interpolation: the mean of the two order statistics around
/// the fractional rank `q · (n − 1)`.
pub fn quartiles(xs: &[f64]) -> Result<Quartiles> {
    let s = sorted_sample(xs, "displacements")?;
    let at = |q: f64| {
        let rank = q * (s.len() - 1) as f64;
        0.5 * (s[rank.floor() as usize] + s[rank.ceil() as usize])
    };
    Ok(Quartiles {
        min: s[0],
        q1: at(0.25),
        median: at(0.5),
        q3: at(0.75),
        max: s[s.len() - 1],
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareCfg {
    /// Evaluation points per original edge in the KS sweep.
    pub granularity: usize,
    pub displacement: Displacement,
}

impl Default for CompareCfg {
    fn default() -> Self {
        Self {
            granularity: 100,
            displacement: Displacement::Signed,
        }
    }
}

impl CompareCfg {
    pub fn validate(&self) -> Result<()> {
        if self.granularity == 0 {
            return Err(GeoError::invalid("granularity must be at least 1"));
        }
        Ok(())
    }
}

/// One row of metrics for a set of trials of a single strategy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub edges: usize,
    pub trials: usize,
    pub wasserstein: f64,
    pub ks: f64,
    pub cdf_area: f64,
    pub displacement: Displacement,
    /// `None` when every original edge has zero length.
    pub quartiles: Option<Quartiles>,
    /// Original edges of length zero, left out of the displacement summary.
    pub skipped_zero_length: usize,
}

/// All metrics of `trials` against `before`.
pub fn compare<E>(before: &Network, trials: &[Network], extractor: &E, cfg: &CompareCfg) -> Result<Comparison>
where
    E: CoordExtractor + ?Sized,
{
    cfg.validate()?;
    let original = edge_lengths(before, extractor)?;
    let per_trial = trials
        .iter()
        .map(|t| aligned_lengths(before, t, extractor))
        .collect::<Result<Vec<_>>>()?;

    let w = wasserstein(&original, &per_trial)?;
    let ks = kolmogorov_smirnov(&original, &per_trial, cfg.granularity)?;
    let means = column_means(&per_trial, original.len())?;
    let displaced = relative_displacement(&original, &means, cfg.displacement)?;
    let q = if displaced.is_empty() {
        None
    } else {
        Some(quartiles(&displaced)?)
    };

    Ok(Comparison {
        edges: original.len(),
        trials: trials.len(),
        wasserstein: w,
        ks: ks.statistic,
        cdf_area: ks.cdf_area,
        displacement: cfg.displacement,
        quartiles: q,
        skipped_zero_length: original.len() - displaced.len(),
    })
}
