//! Planar coordinates and axis-aligned bounds.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Planar coordinate `(x, y)`, read as (longitude, latitude). Elevation is never carried.
pub type Coord = Vector2<f64>;

/// Closed axis-aligned box `[min.x, max.x] × [min.y, max.y]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds2 {
    pub min: Coord,
    pub max: Coord,
}

impl Bounds2 {
    #[inline]
    pub fn new(min: Coord, max: Coord) -> Self {
        Self { min, max }
    }

    /// Tight bounds of a point set. `None` if the set is empty or holds a non-finite point.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Coord>,
    {
        let mut it = points.into_iter();
        let first = it.next()?;
        if !is_finite(first) {
            return None;
        }
        let mut b = Self::new(first, first);
        for p in it {
            if !is_finite(p) {
                return None;
            }
            b.min.x = b.min.x.min(p.x);
            b.min.y = b.min.y.min(p.y);
            b.max.x = b.max.x.max(p.x);
            b.max.y = b.max.y.max(p.y);
        }
        Some(b)
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Closed-box membership (edges count as inside).
    #[inline]
    pub fn contains(&self, p: Coord) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn union(&self, other: &Bounds2) -> Bounds2 {
        Bounds2::new(
            Coord::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            Coord::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        )
    }

    /// Push every side out by `frac` times the span of its axis.
    ///
    /// A zero-extent axis is treated as having unit span, so the result always has area
    /// when `frac > 0`.
    pub fn expand(&self, frac: f64) -> Bounds2 {
        let span = |s: f64| if s > 0.0 { s } else { 1.0 };
        let dx = frac * span(self.width());
        let dy = frac * span(self.height());
        Bounds2::new(
            Coord::new(self.min.x - dx, self.min.y - dy),
            Coord::new(self.max.x + dx, self.max.y + dy),
        )
    }
}

#[inline]
pub(crate) fn is_finite(p: Coord) -> bool {
    p.x.is_finite() && p.y.is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_points_tracks_extremes() {
        let b = Bounds2::from_points([
            Coord::new(1.0, -2.0),
            Coord::new(-3.0, 4.0),
            Coord::new(0.5, 0.5),
        ])
        .unwrap();
        assert_eq!(b.min, Coord::new(-3.0, -2.0));
        assert_eq!(b.max, Coord::new(1.0, 4.0));
        assert!(Bounds2::from_points(Vec::<Coord>::new()).is_none());
        assert!(Bounds2::from_points([Coord::new(f64::NAN, 0.0)]).is_none());
    }

    #[test]
    fn expand_uses_axis_span_and_unit_fallback() {
        let b = Bounds2::new(Coord::new(0.0, 5.0), Coord::new(10.0, 5.0));
        let e = b.expand(0.1);
        assert!((e.min.x + 1.0).abs() < 1e-12 && (e.max.x - 11.0).abs() < 1e-12);
        // Zero height: unit span.
        assert!((e.min.y - 4.9).abs() < 1e-12 && (e.max.y - 5.1).abs() < 1e-12);
    }
}
