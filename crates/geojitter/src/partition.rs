//! Region partitioning: regular grids over a network and boundary filtering.
//!
//! Grid
//! - Bounds of all node coordinates, each side pushed out by `buffer · span` of its
//!   axis (unit span for a zero-extent axis), split into `rows × cols` equal cells.
//! - Cells are numbered row-major from the minimum corner: `index = row · cols + col`,
//!   row 0 at the smallest y, column 0 at the smallest x.
//! - A node lands in the cell whose half-open interval `[lo, hi)` holds it on both axes,
//!   the same rule the crossing-number test applies to the cell polygons. The upper
//!   grid bounds sit a relative `1e-12` past the largest coordinate so nodes on the
//!   outer edge still fall strictly inside a cell.
//! - The input network is not touched. Tagging nodes with their cell is a separate,
//!   explicit step (`GridPartition::tag`) that returns a new network.
//!
//! Filter
//! - Keep nodes inside a boundary region, then edges whose endpoints both survive, then
//!   drop nodes left without edges.

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::{GeoError, Result};
use crate::geom::{Bounds2, Coord, Geometry, Polygon};
use crate::network::{CoordExtractor, Network, NodeId};
use crate::region::{RegionAssignment, RegionKey, RegionSet};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridCfg {
    pub rows: usize,
    pub cols: usize,
    /// Fraction of each axis' span added on both sides of the node bounds.
    pub buffer: f64,
}

impl Default for GridCfg {
    fn default() -> Self {
        Self {
            rows: 10,
            cols: 10,
            buffer: 0.1,
        }
    }
}

impl GridCfg {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(GeoError::invalid(format!(
                "grid needs at least one row and column, got {}x{}",
                self.rows, self.cols
            )));
        }
        if !self.buffer.is_finite() || self.buffer < 0.0 {
            return Err(GeoError::invalid(format!(
                "buffer must be finite and >= 0, got {}",
                self.buffer
            )));
        }
        Ok(())
    }
}

/// Grid cells over a network plus the cell of every node.
#[derive(Clone, Debug)]
pub struct GridPartition {
    bounds: Bounds2,
    rows: usize,
    cols: usize,
    regions: RegionSet,
    assignment: RegionAssignment,
}

impl GridPartition {
    #[inline]
    pub fn bounds(&self) -> Bounds2 {
        self.bounds
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Cells keyed `RegionKey::Index(row · cols + col)`.
    #[inline]
    pub fn regions(&self) -> &RegionSet {
        &self.regions
    }

    #[inline]
    pub fn assignment(&self) -> &RegionAssignment {
        &self.assignment
    }

    pub fn into_parts(self) -> (RegionSet, RegionAssignment) {
        (self.regions, self.assignment)
    }

    /// Cell index holding `p`, or `None` outside the grid bounds.
    pub fn cell_of(&self, p: Coord) -> Option<usize> {
        cell_index(&self.bounds, self.rows, self.cols, p)
    }

    /// Bounds of cell `index`. Shared edges are bit-identical between neighbors.
    pub fn cell_bounds(&self, index: usize) -> Option<Bounds2> {
        if index >= self.rows * self.cols {
            return None;
        }
        let (row, col) = (index / self.cols, index % self.cols);
        Some(Bounds2::new(
            Coord::new(
                edge(self.bounds.min.x, self.bounds.max.x, col, self.cols),
                edge(self.bounds.min.y, self.bounds.max.y, row, self.rows),
            ),
            Coord::new(
                edge(self.bounds.min.x, self.bounds.max.x, col + 1, self.cols),
                edge(self.bounds.min.y, self.bounds.max.y, row + 1, self.rows),
            ),
        ))
    }

    /// Copy of `network` with each assigned node's cell index written to `key`.
    pub fn tag(&self, network: &Network, key: &str) -> Result<Network> {
        let mut out = network.clone();
        for (id, region) in self.assignment.iter() {
            if out.contains_node(id) {
                out.set_attr(id, key, region.to_attr())?;
            }
        }
        Ok(out)
    }
}

/// `k`-th of `n` equal divisions of `[lo, hi]`; exact at both ends.
#[inline]
fn edge(lo: f64, hi: f64, k: usize, n: usize) -> f64 {
    if k == n {
        hi
    } else {
        lo + (hi - lo) * k as f64 / n as f64
    }
}

/// Push the upper bounds just past `hi` so the half-open last cell holds it.
fn close_upper(b: Bounds2) -> Bounds2 {
    let past = |lo: f64, hi: f64| hi + (hi - lo).max(hi.abs()) * UPPER_SLACK;
    Bounds2::new(
        b.min,
        Coord::new(past(b.min.x, b.max.x), past(b.min.y, b.max.y)),
    )
}

const UPPER_SLACK: f64 = 1e-12;

/// Zero-buffer grids over collinear nodes: give a flat axis unit span.
fn pad_flat_axes(b: Bounds2) -> Bounds2 {
    let pad = |lo: f64, hi: f64| if hi > lo { (lo, hi) } else { (lo - 0.5, hi + 0.5) };
    let (x0, x1) = pad(b.min.x, b.max.x);
    let (y0, y1) = pad(b.min.y, b.max.y);
    Bounds2::new(Coord::new(x0, y0), Coord::new(x1, y1))
}

fn cell_index(bounds: &Bounds2, rows: usize, cols: usize, p: Coord) -> Option<usize> {
    if !bounds.contains(p) {
        return None;
    }
    let along = |v: f64, lo: f64, hi: f64, n: usize| -> usize {
        let t = (v - lo) / (hi - lo) * n as f64;
        // Float cast saturates; the clamp keeps `v == hi` in the last cell.
        let mut k = (t.floor() as usize).min(n - 1);
        // Agree with `edge` where rounding puts v on the other side of a cell edge.
        while k > 0 && v < edge(lo, hi, k, n) {
            k -= 1;
        }
        while k + 1 < n && v >= edge(lo, hi, k + 1, n) {
            k += 1;
        }
        k
    };
    let col = along(p.x, bounds.min.x, bounds.max.x, cols);
    let row = along(p.y, bounds.min.y, bounds.max.y, rows);
    Some(row * cols + col)
}

/// Cover the network's nodes with a `rows × cols` grid and assign each node a cell.
///
/// Errors: invalid `cfg`, an empty network, or a node without a finite coordinate.
pub fn grid_partition<E>(network: &Network, extractor: &E, cfg: &GridCfg) -> Result<GridPartition>
where
    E: CoordExtractor + ?Sized,
{
    cfg.validate()?;
    if network.node_count() == 0 {
        return Err(GeoError::Empty { what: "network" });
    }
    let mut located: Vec<(NodeId, Coord)> = Vec::with_capacity(network.node_count());
    for (id, attrs) in network.nodes() {
        match extractor.extract(id, attrs) {
            Some(c) if c.x.is_finite() && c.y.is_finite() => located.push((id.clone(), c)),
            _ => return Err(GeoError::MissingCoordinate(id.clone())),
        }
    }
    let tight = Bounds2::from_points(located.iter().map(|(_, c)| *c))
        .ok_or(GeoError::Empty { what: "network" })?;
    let bounds = close_upper(pad_flat_axes(tight.expand(cfg.buffer)));

    let mut partition = GridPartition {
        bounds,
        rows: cfg.rows,
        cols: cfg.cols,
        regions: RegionSet::new(),
        assignment: RegionAssignment::new(),
    };
    for index in 0..cfg.rows * cfg.cols {
        if let Some(b) = partition.cell_bounds(index) {
            let cell = Polygon::rect(b.min, b.max)?;
            partition
                .regions
                .insert(RegionKey::Index(index), Geometry::from(cell));
        }
    }
    for (id, c) in located {
        if let Some(cell) = partition.cell_of(c) {
            partition.assignment.insert(id, RegionKey::Index(cell));
        }
    }
    debug!(
        rows = cfg.rows,
        cols = cfg.cols,
        assigned = partition.assignment.len(),
        "grid partition built"
    );
    Ok(partition)
}

/// Nodes inside `boundary`, the edges between them, minus nodes left without edges.
///
/// Nodes without a coordinate are treated as outside. Errors only on a boundary
/// without area.
pub fn filter_by_region<E>(network: &Network, boundary: &Geometry, extractor: &E) -> Result<Network>
where
    E: CoordExtractor + ?Sized,
{
    boundary.areal_parts()?;
    let inside = network.induced(|id, attrs| {
        extractor
            .extract(id, attrs)
            .is_some_and(|c| boundary.contains(c))
    });
    let connected: BTreeSet<NodeId> = inside
        .edges()
        .flat_map(|(k, _)| {
            let (a, b) = k.endpoints();
            [a.clone(), b.clone()]
        })
        .collect();
    let kept = inside.induced(|id, _| connected.contains(id));
    debug!(
        before = network.node_count(),
        inside = inside.node_count(),
        kept = kept.node_count(),
        "filtered network by region"
    );
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{Attributes, XyExtractor};
    use crate::region::{ContainmentResolver, RegionResolver};
    use proptest::prelude::*;

    fn net_of(points: &[(f64, f64)]) -> Network {
        let mut net = Network::new();
        for (i, (x, y)) in points.iter().enumerate() {
            net.add_node_at(i as i64, *x, *y);
        }
        net
    }

    #[test]
    fn cells_are_row_major_from_min_corner() {
        let net = net_of(&[(0.0, 0.0), (10.0, 10.0), (9.0, 1.0), (1.0, 9.0)]);
        let cfg = GridCfg {
            rows: 2,
            cols: 2,
            buffer: 0.0,
        };
        let g = grid_partition(&net, &XyExtractor::default(), &cfg).unwrap();
        assert_eq!(g.regions().len(), 4);
        let cell = |i: i64| g.assignment().get(&NodeId::Int(i)).cloned();
        assert_eq!(cell(0), Some(RegionKey::Index(0)));
        assert_eq!(cell(2), Some(RegionKey::Index(1)));
        assert_eq!(cell(3), Some(RegionKey::Index(2)));
        assert_eq!(cell(1), Some(RegionKey::Index(3)));
        let b = g.cell_bounds(1).unwrap();
        assert!((b.min.x - 5.0).abs() < 1e-9 && (b.max.x - 10.0).abs() < 1e-9);
        assert!((b.max.y - 5.0).abs() < 1e-9);
        assert!(g.cell_bounds(4).is_none());
    }

    #[test]
    fn buffer_pushes_each_side_out() {
        let net = net_of(&[(0.0, 0.0), (10.0, 20.0)]);
        let g = grid_partition(&net, &XyExtractor::default(), &GridCfg::default()).unwrap();
        let b = g.bounds();
        assert!((b.min.x + 1.0).abs() < 1e-9 && (b.max.x - 11.0).abs() < 1e-9);
        assert!((b.min.y + 2.0).abs() < 1e-9 && (b.max.y - 22.0).abs() < 1e-9);
        assert_eq!(g.regions().len(), 100);
        assert_eq!(g.assignment().len(), 2);
    }

    #[test]
    fn single_node_gets_a_real_cell() {
        let net = net_of(&[(3.0, 4.0)]);
        let g = grid_partition(&net, &XyExtractor::default(), &GridCfg::new(3, 3)).unwrap();
        let key = g.assignment().get(&NodeId::Int(0)).unwrap();
        let region = g.regions().get(key).unwrap();
        assert!(region.contains(Coord::new(3.0, 4.0)));
        assert_eq!(key, &RegionKey::Index(4));
    }

    #[test]
    fn grid_rejects_bad_input() {
        let ex = XyExtractor::default();
        let net = net_of(&[(0.0, 0.0)]);
        assert!(grid_partition(&net, &ex, &GridCfg::new(0, 3)).is_err());
        let neg = GridCfg {
            buffer: -0.5,
            ..GridCfg::default()
        };
        assert!(grid_partition(&net, &ex, &neg).is_err());
        assert_eq!(
            grid_partition(&Network::new(), &ex, &GridCfg::default()).unwrap_err(),
            GeoError::Empty { what: "network" }
        );
        let mut missing = net_of(&[(0.0, 0.0)]);
        missing.add_node("ghost", Attributes::new());
        assert_eq!(
            grid_partition(&missing, &ex, &GridCfg::default()).unwrap_err(),
            GeoError::MissingCoordinate("ghost".into())
        );
    }

    #[test]
    fn tag_writes_copy_only() {
        let net = net_of(&[(0.0, 0.0), (1.0, 1.0)]);
        let g = grid_partition(&net, &XyExtractor::default(), &GridCfg::new(2, 2)).unwrap();
        let tagged = g.tag(&net, "region").unwrap();
        assert!(net.node(&NodeId::Int(0)).unwrap().get("region").is_none());
        assert_eq!(
            tagged.node(&NodeId::Int(1)).unwrap().get("region"),
            Some(&crate::network::AttrValue::Int(3))
        );
    }

    #[test]
    fn max_corner_is_inside_its_cell_polygon() {
        let net = net_of(&[(0.0, 0.0), (10.0, 10.0)]);
        let cfg = GridCfg {
            rows: 2,
            cols: 2,
            buffer: 0.0,
        };
        let ex = XyExtractor::default();
        let g = grid_partition(&net, &ex, &cfg).unwrap();
        let corner = Coord::new(10.0, 10.0);
        let holding: Vec<_> = g
            .regions()
            .iter()
            .filter(|(_, cell)| cell.contains(corner))
            .map(|(k, _)| k.clone())
            .collect();
        assert_eq!(holding, vec![RegionKey::Index(3)]);
        let resolver = ContainmentResolver::new(g.regions(), &ex);
        let attrs = net.node(&NodeId::Int(1)).unwrap();
        assert_eq!(
            resolver.resolve(&NodeId::Int(1), attrs),
            Some(RegionKey::Index(3))
        );
    }

    fn square_boundary() -> Geometry {
        Polygon::rect(Coord::new(0.0, 0.0), Coord::new(10.0, 10.0))
            .unwrap()
            .into()
    }

    #[test]
    fn filter_prunes_outside_nodes_and_orphans() {
        let mut net = net_of(&[(1.0, 1.0), (2.0, 2.0), (50.0, 50.0), (3.0, 3.0), (4.0, 4.0)]);
        net.add_edge(0i64, 1i64, Attributes::new()).unwrap();
        net.add_edge(2i64, 3i64, Attributes::new()).unwrap();
        // 4 is inside but isolated.
        let out = filter_by_region(&net, &square_boundary(), &XyExtractor::default()).unwrap();
        let ids: Vec<_> = out.node_ids().cloned().collect();
        assert_eq!(ids, vec![NodeId::Int(0), NodeId::Int(1)]);
        assert_eq!(out.edge_count(), 1);
        assert_eq!(net.node_count(), 5);
    }

    #[test]
    fn filter_rejects_non_areal_boundary() {
        let net = net_of(&[(1.0, 1.0)]);
        let pt = Geometry::Point {
            coordinates: Coord::new(1.0, 1.0),
        };
        assert_eq!(
            filter_by_region(&net, &pt, &XyExtractor::default()).unwrap_err(),
            GeoError::InvalidGeometryKind { kind: "Point" }
        );
    }

    proptest! {
        #[test]
        fn prop_grid_covers_every_node(
            points in prop::collection::vec((-100.0f64..100.0, -100.0f64..100.0), 1..60),
            rows in 1usize..8,
            cols in 1usize..8,
            buffer in 0.0f64..0.5,
        ) {
            let net = net_of(&points);
            let cfg = GridCfg { rows, cols, buffer };
            let g = grid_partition(&net, &XyExtractor::default(), &cfg).unwrap();
            prop_assert_eq!(g.assignment().len(), points.len());
            prop_assert_eq!(g.regions().len(), rows * cols);
            for (id, key) in g.assignment().iter() {
                let RegionKey::Index(i) = key else { unreachable!() };
                prop_assert!(*i < rows * cols);
                let p = XyExtractor::default().extract(id, net.node(id).unwrap()).unwrap();
                prop_assert!(g.cell_bounds(*i).unwrap().contains(p));
                let holding: Vec<&RegionKey> = g
                    .regions()
                    .iter()
                    .filter(|(_, cell)| cell.contains(p))
                    .map(|(k, _)| k)
                    .collect();
                prop_assert_eq!(holding, vec![key]);
            }
        }

        #[test]
        fn prop_filter_is_sound_and_idempotent(
            points in prop::collection::vec((-5.0f64..15.0, -5.0f64..15.0), 2..40),
            edges in prop::collection::vec((0usize..40, 0usize..40), 0..80),
        ) {
            let mut net = net_of(&points);
            for (a, b) in edges {
                if a < points.len() && b < points.len() {
                    net.add_edge(a as i64, b as i64, Attributes::new()).unwrap();
                }
            }
            let boundary = square_boundary();
            let ex = XyExtractor::default();
            let once = filter_by_region(&net, &boundary, &ex).unwrap();
            for (id, attrs) in once.nodes() {
                prop_assert!(boundary.contains(ex.extract(id, attrs).unwrap()));
                prop_assert!(once.degree(id) > 0);
            }
            let twice = filter_by_region(&once, &boundary, &ex).unwrap();
            prop_assert_eq!(once, twice);
        }
    }
}
