//! Measurements on projected geometry, computed with `geo`.
//!
//! Projected parts carry per-vertex importance next to their coordinates, so
//! each helper lifts the coordinates into a `geo` type and measures that.

use super::convert::{ConvertedGeometry, ProjectedPart, ProjectedPoint};
use geo::{
    Area, BoundingRect, Coord, Euclidean, Length, LineString, MultiPoint, Point, Polygon, Rect,
    Winding, winding_order::WindingOrder,
};

fn line_string(points: &[ProjectedPoint]) -> LineString<f64> {
    points.iter().map(|p| Coord { x: p.x, y: p.y }).collect()
}

/// Closed ring of `points`.
fn ring(points: &[ProjectedPoint]) -> LineString<f64> {
    let mut ring = line_string(points);
    ring.close();
    ring
}

/// Signed area of a ring. Positive means clockwise in y-down space.
pub fn signed_area(points: &[ProjectedPoint]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    Polygon::new(ring(points), vec![]).signed_area()
}

/// Total length of a path given as plain coordinate pairs.
pub fn path_length(points: &[[f64; 2]]) -> f64 {
    Euclidean.length(&LineString::from(points.to_vec()))
}

/// Length of a projected line.
pub fn line_length(points: &[ProjectedPoint]) -> f64 {
    Euclidean.length(&line_string(points))
}

/// Orients a ring: outer rings clockwise and holes counter-clockwise, both in
/// y-down space.
///
/// `geo` measures winding with y up, so a ring that is clockwise on screen is
/// counter-clockwise to `geo`. Degenerate rings are left alone.
pub fn rewind(part: &mut ProjectedPart, outer: bool) {
    let wanted = if outer {
        WindingOrder::CounterClockwise
    } else {
        WindingOrder::Clockwise
    };
    match ring(&part.points).winding_order() {
        Some(order) if order != wanted => part.points.reverse(),
        _ => {}
    }
}

/// Bounding rectangle of every vertex of a geometry.
pub fn bounding_rect(geometry: &ConvertedGeometry) -> Option<Rect<f64>> {
    let vertices: MultiPoint<f64> = geometry.vertices().map(|p| Point::new(p.x, p.y)).collect();
    vertices.bounding_rect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(coords: &[(f64, f64)]) -> ProjectedPart {
        ProjectedPart::new(
            coords
                .iter()
                .map(|&(x, y)| ProjectedPoint::new(x, y))
                .collect(),
        )
    }

    #[test]
    fn test_signed_area_orientation() {
        // Clockwise on screen: right, then down.
        let cw = ring(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)]);
        assert!((signed_area(&cw.points) - 1.0).abs() < 1e-12);

        let mut ccw = cw.clone();
        ccw.points.reverse();
        assert!((signed_area(&ccw.points) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rewind() {
        let mut outer = ring(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0), (0.0, 0.0)]);
        rewind(&mut outer, true);
        assert!(signed_area(&outer.points) > 0.0);

        let mut hole = outer.clone();
        rewind(&mut hole, false);
        assert!(signed_area(&hole.points) < 0.0);
    }

    #[test]
    fn test_bounding_rect() {
        let geometry = ConvertedGeometry::Lines(vec![
            ring(&[(0.2, 0.4), (0.3, 0.1)]),
            ring(&[(0.25, 0.9)]),
        ]);
        let rect = bounding_rect(&geometry).unwrap();
        assert_eq!(rect.min(), Coord { x: 0.2, y: 0.1 });
        assert_eq!(rect.max(), Coord { x: 0.3, y: 0.9 });

        assert!(bounding_rect(&ConvertedGeometry::Points(vec![])).is_none());
    }

    #[test]
    fn test_rewind_leaves_degenerate_ring() {
        let mut flat = ring(&[(0.0, 0.0), (1.0, 0.0), (0.0, 0.0)]);
        let before = flat.clone();
        rewind(&mut flat, true);
        assert_eq!(flat.points, before.points);
        assert_eq!(signed_area(&flat.points), 0.0);
    }

    #[test]
    fn test_rewind_keeps_importance_with_its_vertex() {
        let mut outer = ring(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0), (0.0, 0.0)]);
        outer.points[1].importance = 0.5;
        rewind(&mut outer, true);

        let marked = outer.points.iter().find(|p| p.importance == 0.5).unwrap();
        assert_eq!((marked.x, marked.y), (0.0, 1.0));
    }

    #[test]
    fn test_lengths() {
        let part = ring(&[(0.0, 0.0), (3.0, 4.0), (3.0, 5.0)]);
        assert!((line_length(&part.points) - 6.0).abs() < 1e-12);
        assert!((path_length(&[[0.0, 0.0], [0.0, 2.0]]) - 2.0).abs() < 1e-12);
    }
}
