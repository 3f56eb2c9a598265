use super::*;
use crate::error::GeoError;
use rand::{rngs::StdRng, SeedableRng};

fn unit_square() -> Polygon {
    Polygon::rect(Coord::new(0.0, 0.0), Coord::new(1.0, 1.0)).unwrap()
}

/// Concave "L": the unit-2 square minus its upper-right quadrant.
fn l_shape() -> Polygon {
    Polygon::new(vec![
        Coord::new(0.0, 0.0),
        Coord::new(2.0, 0.0),
        Coord::new(2.0, 1.0),
        Coord::new(1.0, 1.0),
        Coord::new(1.0, 2.0),
        Coord::new(0.0, 2.0),
    ])
    .unwrap()
}

#[test]
fn crossing_number_inside_outside() {
    let sq = unit_square();
    assert!(sq.contains(Coord::new(0.5, 0.5)));
    assert!(!sq.contains(Coord::new(1.5, 0.5)));
    assert!(!sq.contains(Coord::new(-0.1, 0.5)));
    let l = l_shape();
    assert!(l.contains(Coord::new(0.5, 1.5)));
    assert!(l.contains(Coord::new(1.5, 0.5)));
    assert!(!l.contains(Coord::new(1.5, 1.5)));
}

#[test]
fn boundary_membership_is_half_open() {
    let sq = unit_square();
    assert!(sq.contains(Coord::new(0.0, 0.5)));
    assert!(sq.contains(Coord::new(0.5, 0.0)));
    assert!(!sq.contains(Coord::new(1.0, 0.5)));
    assert!(!sq.contains(Coord::new(0.5, 1.0)));
}

#[test]
fn holes_are_excluded() {
    let poly = Polygon::with_holes(
        vec![
            Coord::new(0.0, 0.0),
            Coord::new(4.0, 0.0),
            Coord::new(4.0, 4.0),
            Coord::new(0.0, 4.0),
        ],
        vec![vec![
            Coord::new(1.0, 1.0),
            Coord::new(3.0, 1.0),
            Coord::new(3.0, 3.0),
            Coord::new(1.0, 3.0),
        ]],
    )
    .unwrap();
    assert!(poly.contains(Coord::new(0.5, 0.5)));
    assert!(!poly.contains(Coord::new(2.0, 2.0)));
    assert!((poly.area() - 12.0).abs() < 1e-12);
}

#[test]
fn rings_are_closed_and_validated() {
    let sq = unit_square();
    assert_eq!(sq.exterior().first(), sq.exterior().last());
    assert_eq!(sq.exterior().len(), 5);
    let closed = Polygon::new(sq.exterior().to_vec()).unwrap();
    assert_eq!(closed.exterior().len(), 5);

    let two = Polygon::new(vec![Coord::new(0.0, 0.0), Coord::new(1.0, 0.0), Coord::new(0.0, 0.0)]);
    assert!(matches!(two, Err(GeoError::InvalidRing { .. })));
    let nan = Polygon::new(vec![
        Coord::new(0.0, 0.0),
        Coord::new(f64::NAN, 0.0),
        Coord::new(0.0, 1.0),
    ]);
    assert!(matches!(nan, Err(GeoError::InvalidRing { .. })));
}

#[test]
fn multipolygon_contains_any_part() {
    let a = unit_square();
    let b = Polygon::rect(Coord::new(5.0, 5.0), Coord::new(6.0, 6.0)).unwrap();
    let m = MultiPolygon::new(vec![a, b]).unwrap();
    assert!(m.contains(Coord::new(0.5, 0.5)));
    assert!(m.contains(Coord::new(5.5, 5.5)));
    assert!(!m.contains(Coord::new(3.0, 3.0)));
    assert_eq!(m.bounds().max, Coord::new(6.0, 6.0));
    assert!(MultiPolygon::new(Vec::new()).is_err());
}

#[test]
fn non_areal_geometry_is_rejected() {
    let g = Geometry::LineString {
        coordinates: vec![Coord::new(0.0, 0.0), Coord::new(1.0, 1.0)],
    };
    assert_eq!(
        g.areal_parts().unwrap_err(),
        GeoError::InvalidGeometryKind { kind: "LineString" }
    );
    assert!(!g.contains(Coord::new(0.5, 0.5)));
}

#[test]
fn triangulation_covers_concave_area() {
    let l = l_shape();
    let tri = Triangulated::of_polygon(&l).unwrap();
    assert!((tri.area() - 3.0).abs() < 1e-9);
    for t in tri.triangles() {
        assert!(l.contains(t.centroid()));
    }
}

#[test]
fn triangulation_respects_holes() {
    let poly = Polygon::with_holes(
        vec![
            Coord::new(0.0, 0.0),
            Coord::new(4.0, 0.0),
            Coord::new(4.0, 4.0),
            Coord::new(0.0, 4.0),
        ],
        vec![vec![
            Coord::new(1.0, 1.0),
            Coord::new(3.0, 1.0),
            Coord::new(3.0, 3.0),
            Coord::new(1.0, 3.0),
        ]],
    )
    .unwrap();
    let tri = Triangulated::of_polygon(&poly).unwrap();
    assert!((tri.area() - 12.0).abs() < 1e-9);
}

#[test]
fn collinear_ring_degenerates() {
    let flat = Polygon::new(vec![
        Coord::new(0.0, 0.0),
        Coord::new(1.0, 0.0),
        Coord::new(2.0, 0.0),
    ])
    .unwrap();
    assert_eq!(
        Triangulated::of_polygon(&flat).unwrap_err(),
        GeoError::DegenerateTriangulation { region: None }
    );
}

#[test]
fn triangulated_samples_land_inside() {
    let l = l_shape();
    let tri = Triangulated::of_polygon(&l).unwrap();
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..2000 {
        let p = tri.sample(&mut rng);
        assert!(l.bounds().contains(p));
        assert!(!(p.x > 1.0 && p.y > 1.0), "sample {p:?} fell in the notch");
    }
}

#[test]
fn triangle_choice_is_area_weighted() {
    // Two triangles with areas 1 and 3 -> picks in ratio ~1:3.
    let small = Triangle::new(Coord::new(0.0, 0.0), Coord::new(2.0, 0.0), Coord::new(0.0, 1.0));
    let big = Triangle::new(Coord::new(10.0, 0.0), Coord::new(16.0, 0.0), Coord::new(10.0, 1.0));
    let tri = Triangulated::from_triangles(vec![small, big]).unwrap();
    let mut rng = StdRng::seed_from_u64(11);
    let n = 20_000;
    let big_hits = (0..n).filter(|_| *tri.pick(&mut rng) == big).count();
    let frac = big_hits as f64 / n as f64;
    assert!((frac - 0.75).abs() < 0.02, "frac = {frac}");
}

#[test]
fn barycentric_sample_is_uniform_over_triangle() {
    // For the right triangle (0,0),(1,0),(0,1), the mean of x is 1/3.
    let t = Triangle::new(Coord::new(0.0, 0.0), Coord::new(1.0, 0.0), Coord::new(0.0, 1.0));
    let mut rng = StdRng::seed_from_u64(3);
    let n = 40_000;
    let mut sum = Coord::zeros();
    for _ in 0..n {
        let p = t.sample(&mut rng);
        assert!(p.x >= 0.0 && p.y >= 0.0 && p.x + p.y <= 1.0 + 1e-12);
        sum += p;
    }
    let mean = sum / n as f64;
    assert!((mean.x - 1.0 / 3.0).abs() < 0.01);
    assert!((mean.y - 1.0 / 3.0).abs() < 0.01);
}
