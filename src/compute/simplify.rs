//! Vertex importance for zoom-dependent simplification.
//!
//! Instead of simplifying once per zoom, each vertex is marked once with the
//! squared distance at which Douglas-Peucker would drop it. A tile at any
//! zoom then keeps exactly the vertices whose importance exceeds that zoom's
//! squared tolerance. Endpoints are marked `1.0` and always survive.

use super::convert::ProjectedPoint;

/// Marks every vertex of `points` with its importance.
///
/// Vertices that never exceed `sq_tolerance` keep an importance of `0.0`.
pub fn mark_importance(points: &mut [ProjectedPoint], sq_tolerance: f64) {
    let n = points.len();
    if n == 0 {
        return;
    }
    points[0].importance = 1.0;
    points[n - 1].importance = 1.0;
    if n < 3 {
        return;
    }

    let mut stack = vec![(0usize, n - 1)];
    while let Some((first, last)) = stack.pop() {
        let (a, b) = (points[first], points[last]);
        let mid = first + (last - first) / 2;

        let mut max_sq_dist = sq_tolerance;
        let mut farthest = None;
        let mut closest_to_mid = last - first;

        for (i, point) in points.iter().enumerate().take(last).skip(first + 1) {
            let d = sq_segment_distance(point, &a, &b);
            if d > max_sq_dist {
                farthest = Some(i);
                max_sq_dist = d;
            } else if d == max_sq_dist {
                // Ties go to the vertex nearest the middle for balanced splits.
                let to_mid = i.abs_diff(mid);
                if to_mid < closest_to_mid {
                    farthest = Some(i);
                    closest_to_mid = to_mid;
                }
            }
        }

        if let Some(index) = farthest
            && max_sq_dist > sq_tolerance
        {
            points[index].importance = max_sq_dist;
            if index - first > 1 {
                stack.push((first, index));
            }
            if last - index > 1 {
                stack.push((index, last));
            }
        }
    }
}

/// Squared distance from `p` to the segment `a`-`b`.
fn sq_segment_distance(p: &ProjectedPoint, a: &ProjectedPoint, b: &ProjectedPoint) -> f64 {
    let (mut x, mut y) = (a.x, a.y);
    let (dx, dy) = (b.x - x, b.y - y);

    if dx != 0.0 || dy != 0.0 {
        let t = ((p.x - x) * dx + (p.y - y) * dy) / (dx * dx + dy * dy);
        if t > 1.0 {
            x = b.x;
            y = b.y;
        } else if t > 0.0 {
            x += dx * t;
            y += dy * t;
        }
    }

    let (dx, dy) = (p.x - x, p.y - y);
    dx * dx + dy * dy
}
